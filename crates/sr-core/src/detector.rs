//! Stoppage interval detection.
//!
//! Turns a stream of motion-status events into stoppage records. The detector
//! holds at most one open stoppage; it never touches the report store itself
//! and instead emits [`RecordMutation`]s for the caller to apply.
//!
//! # Rules
//!
//! 1. `Stopped` with nothing open opens a record starting at the event time.
//! 2. `Moving` with a record open closes it with the elapsed time, if positive.
//!    The open reference is dropped either way.
//! 3. Anything else is ignored, which makes duplicated or retransmitted
//!    events harmless.

use chrono::{DateTime, Local, Utc};

use crate::event::StatusEvent;
use crate::record::{StoppageRecord, format_stoppage};
use crate::types::{MotionStatus, RecordId};

/// A change the detector asks the report store to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMutation {
    /// A new open record should be appended.
    Created(StoppageRecord),
    /// The open record should be stamped with its final duration.
    Closed {
        id: RecordId,
        stoppage_time_ms: i64,
        stoppage_time_display: String,
    },
}

/// The stoppage currently waiting for a `Moving` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenStoppage {
    pub id: RecordId,
    pub start_time: DateTime<Utc>,
}

/// Stateful Stopped→Moving interval detector.
#[derive(Debug, Default)]
pub struct StoppageDetector {
    open: Option<OpenStoppage>,
}

impl StoppageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes an event using the system clock as ingestion time.
    pub fn observe(&mut self, event: &StatusEvent) -> Option<RecordMutation> {
        self.observe_at(event, Utc::now())
    }

    /// Observes an event with an explicit ingestion time.
    ///
    /// `now` stands in for missing event timestamps and supplies the record's
    /// creation date and time.
    pub fn observe_at(&mut self, event: &StatusEvent, now: DateTime<Utc>) -> Option<RecordMutation> {
        let at = event.timestamp.unwrap_or(now);

        match (event.status, self.open.take()) {
            (MotionStatus::Stopped, None) => {
                let id = RecordId::generate();
                let record = StoppageRecord::open(id.clone(), at, &now.with_timezone(&Local));
                tracing::debug!(id = %id, start_time = %at, "stoppage opened");
                self.open = Some(OpenStoppage { id, start_time: at });
                Some(RecordMutation::Created(record))
            }
            (MotionStatus::Moving, Some(open)) => {
                let elapsed = (at - open.start_time).num_milliseconds().max(0);
                if elapsed == 0 {
                    tracing::debug!(id = %open.id, "stoppage closed without positive duration");
                    return None;
                }
                tracing::debug!(id = %open.id, elapsed_ms = elapsed, "stoppage closed");
                Some(RecordMutation::Closed {
                    id: open.id,
                    stoppage_time_ms: elapsed,
                    stoppage_time_display: format_stoppage(elapsed),
                })
            }
            (_, open) => {
                // Stopped while open, or Moving while closed.
                self.open = open;
                None
            }
        }
    }

    /// The stoppage currently open, if any.
    pub const fn open_stoppage(&self) -> Option<&OpenStoppage> {
        self.open.as_ref()
    }

    /// Drops the open reference without emitting a mutation.
    ///
    /// Used when the record it points at has been cleared from the store.
    pub fn reset(&mut self) {
        self.open = None;
    }
}
