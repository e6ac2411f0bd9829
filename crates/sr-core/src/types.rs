//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid motion status value.
    #[error("invalid motion status: {value}")]
    InvalidMotionStatus { value: String },
}

/// Motion state reported by the tracker for the watched machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionStatus {
    Moving,
    Stopped,
}

impl MotionStatus {
    /// Wire representation, as sent by the tracker.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Moving => "Moving",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MotionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Moving" => Ok(Self::Moving),
            "Stopped" => Ok(Self::Stopped),
            _ => Err(ValidationError::InvalidMotionStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A validated stoppage record identifier.
///
/// Record IDs must be non-empty strings. Fresh IDs are random UUIDs, so an ID
/// is never handed out twice, even after the store has been cleared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new ID after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::Empty { field: "record ID" });
        }
        Ok(Self(id))
    }

    /// Generates a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_rejects_empty() {
        assert!(RecordId::new("").is_err());
        assert!(RecordId::new("valid-id").is_ok());
    }

    #[test]
    fn record_id_serde_rejects_empty() {
        let result: Result<RecordId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn generated_ids_are_distinct_uuids() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        Uuid::parse_str(a.as_str()).unwrap();
    }

    #[test]
    fn motion_status_from_str() {
        assert_eq!("Moving".parse::<MotionStatus>().unwrap(), MotionStatus::Moving);
        assert_eq!(
            "Stopped".parse::<MotionStatus>().unwrap(),
            MotionStatus::Stopped
        );
        let err = "stopped".parse::<MotionStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid motion status: stopped");
    }

    #[test]
    fn motion_status_serializes_as_wire_string() {
        let json = serde_json::to_string(&MotionStatus::Stopped).unwrap();
        assert_eq!(json, "\"Stopped\"");
        let parsed: MotionStatus = serde_json::from_str("\"Moving\"").unwrap();
        assert_eq!(parsed, MotionStatus::Moving);
    }
}
