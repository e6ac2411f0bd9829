//! Process-scoped facade over the stoppage report.
//!
//! The [`Engine`] owns the interval detector, the telemetry buffer and the
//! annotation drafts, and shares the report store with background tasks such
//! as the rollover scheduler. Every operator-facing operation goes through it
//! so that observers get a [`ReportEvent`] for each change.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::annotation::AnnotationDrafts;
use crate::detector::{OpenStoppage, RecordMutation, StoppageDetector};
use crate::event::StatusEvent;
use crate::export::{Artifact, ExportError, ReportExporter};
use crate::notify::{self, ReportEvent, publish};
use crate::record::StoppageRecord;
use crate::rollover::{ClearPolicy, RolloverContext};
use crate::store::{RecordPatch, ReportStore, SharedStore, StoreError, lock_store};
use crate::telemetry::TelemetryBuffer;
use crate::types::RecordId;

/// The stoppage tracking and reporting engine.
#[derive(Debug)]
pub struct Engine {
    store: SharedStore,
    detector: StoppageDetector,
    telemetry: TelemetryBuffer,
    drafts: AnnotationDrafts,
    exporter: ReportExporter,
    events: broadcast::Sender<ReportEvent>,
}

impl Engine {
    pub fn new(store: ReportStore, exporter: ReportExporter) -> Self {
        Self {
            store: store.into_shared(),
            detector: StoppageDetector::new(),
            telemetry: TelemetryBuffer::default(),
            drafts: AnnotationDrafts::new(),
            exporter,
            events: notify::channel(),
        }
    }

    /// Replaces the telemetry buffer with an empty one of the given capacity.
    #[must_use]
    pub fn with_telemetry_capacity(mut self, capacity: usize) -> Self {
        self.telemetry = TelemetryBuffer::with_capacity(capacity);
        self
    }

    /// Subscribes to report notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.events.subscribe()
    }

    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    pub const fn telemetry(&self) -> &TelemetryBuffer {
        &self.telemetry
    }

    pub const fn open_stoppage(&self) -> Option<&OpenStoppage> {
        self.detector.open_stoppage()
    }

    /// Snapshot of the report in insertion order.
    pub fn list(&self) -> Vec<StoppageRecord> {
        lock_store(&self.store).list()
    }

    /// Ingests a status event, using the system clock as ingestion time.
    pub fn ingest(&mut self, event: StatusEvent) -> Result<Option<RecordMutation>, StoreError> {
        self.ingest_at(event, Utc::now())
    }

    /// Ingests a status event with an explicit ingestion time.
    ///
    /// Returns the mutation the detector produced, if any. A store error means
    /// the mutation could not be applied; the detector state has still moved on.
    pub fn ingest_at(
        &mut self,
        event: StatusEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<RecordMutation>, StoreError> {
        let mutation = self.detector.observe_at(&event, now);
        self.telemetry.push(event);

        if let Some(mutation) = &mutation {
            self.apply(mutation)?;
        }
        Ok(mutation)
    }

    fn apply(&self, mutation: &RecordMutation) -> Result<(), StoreError> {
        let mut store = lock_store(&self.store);
        match mutation {
            RecordMutation::Created(record) => {
                let result = store.append(record.clone());
                drop(store);
                if matches!(result, Ok(()) | Err(StoreError::Mirror(_))) {
                    publish(&self.events, ReportEvent::RecordCreated(record.id.clone()));
                }
                result
            }
            RecordMutation::Closed {
                id,
                stoppage_time_ms,
                stoppage_time_display,
            } => {
                let result = store.update(
                    id,
                    RecordPatch::Close {
                        stoppage_time_ms: *stoppage_time_ms,
                        stoppage_time_display: stoppage_time_display.clone(),
                    },
                );
                drop(store);
                let result = match result {
                    // The report was cleared or rolled over while the stoppage was open.
                    Err(StoreError::NotFound(_)) => {
                        tracing::debug!(id = %id, "stoppage closed after its record was cleared");
                        return Ok(());
                    }
                    other => other.map(|_| ()),
                };
                if matches!(result, Ok(()) | Err(StoreError::Mirror(_))) {
                    publish(
                        &self.events,
                        ReportEvent::RecordClosed {
                            id: id.clone(),
                            stoppage_time_ms: *stoppage_time_ms,
                        },
                    );
                }
                result
            }
        }
    }

    /// Exports the current report without clearing it.
    pub async fn export(&self) -> Result<Artifact, ExportError> {
        export_snapshot(self.exporter.clone(), self.events.clone(), self.list()).await
    }

    /// Starts an export on the runtime and returns immediately.
    ///
    /// The snapshot is taken now; events ingested afterwards are not included.
    pub fn spawn_export(&self) -> JoinHandle<Result<Artifact, ExportError>> {
        tokio::spawn(export_snapshot(
            self.exporter.clone(),
            self.events.clone(),
            self.list(),
        ))
    }

    /// Removes every record. Any open stoppage and in-progress edits are dropped.
    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let (result, removed) = {
            let mut store = lock_store(&self.store);
            let before = store.len();
            let result = store.clear();
            (result, before - store.len())
        };
        self.detector.reset();
        self.drafts = AnnotationDrafts::new();

        tracing::info!(removed, "report cleared");
        publish(&self.events, ReportEvent::Cleared { removed });
        result
    }

    /// Starts editing the remarks of `id`. Returns the seeded draft.
    pub fn begin_edit(&mut self, id: &RecordId) -> Result<String, StoreError> {
        let store = lock_store(&self.store);
        self.drafts.begin_edit(&store, id).map(ToString::to_string)
    }

    /// Replaces the draft of an edit in progress.
    pub fn set_draft(&mut self, id: &RecordId, text: impl Into<String>) -> bool {
        self.drafts.set_draft(id, text)
    }

    pub fn draft(&self, id: &RecordId) -> Option<&str> {
        self.drafts.draft(id)
    }

    /// Abandons an edit without touching the record.
    pub fn cancel_edit(&mut self, id: &RecordId) -> bool {
        self.drafts.cancel_edit(id)
    }

    /// Commits `text` as the remarks of `id`.
    pub fn commit_edit(
        &mut self,
        id: &RecordId,
        text: impl Into<String>,
    ) -> Result<StoppageRecord, StoreError> {
        let result = {
            let mut store = lock_store(&self.store);
            self.drafts.commit_edit(&mut store, id, text)
        };
        if matches!(result, Ok(_) | Err(StoreError::Mirror(_))) {
            publish(&self.events, ReportEvent::RemarksUpdated(id.clone()));
        }
        result
    }

    /// Builds the context the rollover scheduler runs with.
    pub fn rollover_context(&self, policy: ClearPolicy) -> RolloverContext {
        RolloverContext {
            store: self.store.clone(),
            exporter: self.exporter.clone(),
            events: self.events.clone(),
            policy,
        }
    }
}

async fn export_snapshot(
    exporter: ReportExporter,
    events: broadcast::Sender<ReportEvent>,
    snapshot: Vec<StoppageRecord>,
) -> Result<Artifact, ExportError> {
    match exporter.export(snapshot).await {
        Ok(artifact) => {
            publish(&events, ReportEvent::Exported(artifact.clone()));
            Ok(artifact)
        }
        Err(e) => {
            tracing::warn!(error = %e, "export failed, report left intact");
            publish(
                &events,
                ReportEvent::ExportFailed {
                    reason: e.to_string(),
                },
            );
            Err(e)
        }
    }
}
