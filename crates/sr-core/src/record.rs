//! Stoppage records - the durable unit of the report.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// One stoppage interval as shown in the report.
///
/// A record is created open (`stoppage_time_ms == 0`) and closed at most once,
/// when the machine starts moving again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppageRecord {
    /// Unique identifier (UUID).
    pub id: RecordId,

    /// When the stoppage began.
    pub start_time: DateTime<Utc>,

    /// Local calendar date at creation, e.g. `1/27/2025`.
    pub date: String,

    /// Local wall-clock time at creation, e.g. `3:04:05 PM`.
    pub time: String,

    /// Stoppage duration in milliseconds. Zero while the stoppage is open.
    #[serde(default)]
    pub stoppage_time_ms: i64,

    /// Human-readable duration, derived from `stoppage_time_ms` at close time.
    #[serde(default = "open_display")]
    pub stoppage_time_display: String,

    /// Operator annotation.
    #[serde(default)]
    pub remarks: String,
}

fn open_display() -> String {
    format_stoppage(0)
}

impl StoppageRecord {
    /// Creates an open record.
    ///
    /// `created_at` supplies the human-readable `date` and `time` fields and is
    /// normally the ingestion clock in the local time zone.
    pub fn open<Tz>(id: RecordId, start_time: DateTime<Utc>, created_at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            id,
            start_time,
            date: created_at.format("%-m/%-d/%Y").to_string(),
            time: created_at.format("%-I:%M:%S %p").to_string(),
            stoppage_time_ms: 0,
            stoppage_time_display: open_display(),
            remarks: String::new(),
        }
    }

    /// Whether a duration has been stamped on this record.
    pub const fn is_closed(&self) -> bool {
        self.stoppage_time_ms > 0
    }
}

/// Formats a stoppage duration.
///
/// Sub-second durations are shown in whole milliseconds; longer ones in
/// seconds, minutes or hours with two decimals. Non-positive input is `0 ms`.
#[expect(
    clippy::cast_precision_loss,
    reason = "durations stay far below 2^52 ms"
)]
pub fn format_stoppage(ms: i64) -> String {
    const SECOND: i64 = 1_000;
    const MINUTE: i64 = 60 * SECOND;
    const HOUR: i64 = 60 * MINUTE;

    if ms <= 0 {
        return "0 ms".to_string();
    }
    let value = ms as f64;
    if ms < SECOND {
        format!("{ms} ms")
    } else if ms < MINUTE {
        format!("{:.2} s", value / SECOND as f64)
    } else if ms < HOUR {
        format!("{:.2} min", value / MINUTE as f64)
    } else {
        format!("{:.2} h", value / HOUR as f64)
    }
}
