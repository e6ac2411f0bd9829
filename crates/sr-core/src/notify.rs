//! Change notifications for observers of the report (UIs, loggers).

use tokio::sync::broadcast;

use crate::export::Artifact;
use crate::types::RecordId;

/// Capacity of the notification channel. Slow subscribers miss older events.
pub const NOTIFY_CAPACITY: usize = 64;

/// Something observable happened to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// A stoppage opened and its record was appended.
    RecordCreated(RecordId),
    /// A stoppage closed and its duration was stamped.
    RecordClosed { id: RecordId, stoppage_time_ms: i64 },
    /// An operator committed remarks.
    RemarksUpdated(RecordId),
    /// The report was cleared by an operator.
    Cleared { removed: usize },
    /// A spreadsheet was written.
    Exported(Artifact),
    /// Writing a spreadsheet failed. The report is unchanged by the failure.
    ExportFailed { reason: String },
    /// A scheduled rollover finished.
    RolloverCompleted { exported: bool, cleared: usize },
}

/// Creates the notification channel.
pub fn channel() -> broadcast::Sender<ReportEvent> {
    broadcast::channel(NOTIFY_CAPACITY).0
}

/// Publishes `event`, ignoring the case where nobody is listening.
pub(crate) fn publish(sender: &broadcast::Sender<ReportEvent>, event: ReportEvent) {
    let _ = sender.send(event);
}
