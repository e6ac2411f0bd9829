//! Motion-status events delivered by the tracker.
//!
//! The tracker emits one JSON object per detection tick. Only `isMoving` and
//! `timestamp` matter here; everything else it sends (position, velocity,
//! confidence, ...) is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{MotionStatus, ValidationError};

/// Error parsing an inbound status event.
#[derive(Debug, Error)]
#[error("invalid status event: {0}")]
pub struct EventParseError(#[from] serde_json::Error);

/// A single motion-status observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStatusEvent")]
pub struct StatusEvent {
    /// Whether the machine was moving at `timestamp`.
    #[serde(rename = "isMoving")]
    pub status: MotionStatus,
    /// When the tracker observed the status. `None` when the source omitted it
    /// or sent something unparseable; consumers substitute ingestion time.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StatusEvent {
    /// Creates an event with an explicit timestamp.
    pub const fn new(status: MotionStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            status,
            timestamp: Some(timestamp),
        }
    }

    /// Creates an event without a timestamp.
    pub const fn untimed(status: MotionStatus) -> Self {
        Self {
            status,
            timestamp: None,
        }
    }

    /// Parses one JSON-encoded event as sent by the tracker.
    pub fn from_json(s: &str) -> Result<Self, EventParseError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Wire shape of a status event before normalization.
#[derive(Debug, Deserialize)]
struct RawStatusEvent {
    #[serde(rename = "isMoving")]
    is_moving: String,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl TryFrom<RawStatusEvent> for StatusEvent {
    type Error = ValidationError;

    fn try_from(raw: RawStatusEvent) -> Result<Self, Self::Error> {
        let status = raw.is_moving.parse()?;
        let timestamp = raw.timestamp.as_ref().and_then(parse_timestamp);
        Ok(Self { status, timestamp })
    }
}

/// Normalizes an epoch-millis number, numeric string, or RFC 3339 string.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(truncate_millis))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().map_or_else(
                |_| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                },
                DateTime::from_timestamp_millis,
            )
        }
        Value::Null => return None,
        _ => None,
    };

    if parsed.is_none() {
        tracing::debug!(timestamp = %value, "unparseable event timestamp, using ingestion time");
    }
    parsed
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "fractional epoch millis are truncated to whole millis"
)]
fn truncate_millis(millis: f64) -> i64 {
    millis as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn parses_tracker_payload() {
        let json = r#"{
            "id": 3,
            "type": "forklift",
            "position": {"x": 120, "y": 44},
            "velocity": 0.0,
            "direction": "N/A",
            "isMoving": "Stopped",
            "confidence": 0.91,
            "timestamp": 1737979200000
        }"#;
        let event = StatusEvent::from_json(json).unwrap();
        assert_eq!(event.status, MotionStatus::Stopped);
        assert_eq!(
            event.timestamp,
            Some(Utc.with_ymd_and_hms(2025, 1, 27, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn accepts_iso_and_numeric_string_timestamps() {
        let iso = StatusEvent::from_json(
            r#"{"isMoving": "Moving", "timestamp": "2025-01-27T12:00:01.500Z"}"#,
        )
        .unwrap();
        assert_eq!(
            iso.timestamp.unwrap().timestamp_millis(),
            1_737_979_201_500
        );

        let numeric =
            StatusEvent::from_json(r#"{"isMoving": "Moving", "timestamp": "1737979201500"}"#)
                .unwrap();
        assert_eq!(numeric.timestamp, iso.timestamp);
    }

    #[test]
    fn missing_or_garbage_timestamp_degrades_to_none() {
        let missing = StatusEvent::from_json(r#"{"isMoving": "Stopped"}"#).unwrap();
        assert_eq!(missing.timestamp, None);

        let garbage =
            StatusEvent::from_json(r#"{"isMoving": "Stopped", "timestamp": "yesterday"}"#)
                .unwrap();
        assert_eq!(garbage.timestamp, None);

        let null = StatusEvent::from_json(r#"{"isMoving": "Stopped", "timestamp": null}"#).unwrap();
        assert_eq!(null.timestamp, None);
    }

    #[test]
    fn rejects_unknown_status() {
        let result = StatusEvent::from_json(r#"{"isMoving": "Idle", "timestamp": 0}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid motion status: Idle"));
    }

    #[test]
    fn serializes_in_wire_shape() {
        let event = StatusEvent::new(
            MotionStatus::Moving,
            DateTime::from_timestamp_millis(1_500).unwrap(),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"isMoving":"Moving","timestamp":1500}"#);
    }
}
