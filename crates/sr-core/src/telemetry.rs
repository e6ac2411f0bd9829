//! Rolling buffer of the most recent status events, for live display.

use std::collections::VecDeque;

use crate::event::StatusEvent;
use crate::types::MotionStatus;

/// Default number of events kept.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 10;

/// Fixed-capacity FIFO of recent events. The oldest event is evicted first.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    events: VecDeque<StatusEvent>,
    capacity: usize,
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TELEMETRY_CAPACITY)
    }
}

impl TelemetryBuffer {
    /// Creates a buffer holding at most `capacity` events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: StatusEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The most recent event.
    pub fn latest(&self) -> Option<&StatusEvent> {
        self.events.back()
    }

    /// Status from the most recent event.
    pub fn current_status(&self) -> Option<MotionStatus> {
        self.latest().map(|e| e.status)
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
