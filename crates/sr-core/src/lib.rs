//! Core domain logic for the stoppage report.
//!
//! This crate contains the fundamental types and logic for:
//! - Detection: turning a stream of moving/stopped events into stoppage records
//! - The report store: ordered records mirrored to durable storage
//! - Annotation: operator remarks on individual records
//! - Export and rollover: writing the report out and clearing it on a schedule

pub mod annotation;
pub mod detector;
mod engine;
pub mod event;
pub mod export;
pub mod notify;
mod record;
pub mod rollover;
pub mod store;
pub mod telemetry;
mod types;

#[cfg(test)]
mod test_support;

pub use annotation::AnnotationDrafts;
pub use detector::{OpenStoppage, RecordMutation, StoppageDetector};
pub use engine::Engine;
pub use event::{EventParseError, StatusEvent};
pub use export::{Artifact, Cell, ExportError, ReportExporter, Table, TabularWriter, WriterError};
pub use notify::ReportEvent;
pub use record::{StoppageRecord, format_stoppage};
pub use rollover::{
    ClearPolicy, DEFAULT_ROLLOVER_PERIOD, RolloverContext, RolloverOutcome, RolloverScheduler,
    RolloverState, rollover_once,
};
pub use store::{
    MIRROR_KEY, MemoryMirror, Mirror, MirrorError, RecordPatch, ReportStore, SharedStore,
    StoreError, lock_store,
};
pub use telemetry::{DEFAULT_TELEMETRY_CAPACITY, TelemetryBuffer};
pub use types::{MotionStatus, RecordId, ValidationError};
