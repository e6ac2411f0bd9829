//! Scheduled rollover: export the report, then clear it, on a fixed period.
//!
//! The scheduler is an explicit component. [`RolloverScheduler::start`] arms
//! the timer on the current tokio runtime and [`RolloverScheduler::cancel`]
//! disarms it at teardown. A firing that has started always runs to
//! completion; only the pending timer is cancellable.
//!
//! # Clearing after a failed export
//!
//! With [`ClearPolicy::Always`] the report is cleared even when the export
//! fails, which bounds storage growth at the cost of losing the unexported
//! records. [`ClearPolicy::OnExportSuccess`] keeps them for the next attempt.
//!
//! A rollover removes exactly the records it exported, so stoppages that are
//! appended while the spreadsheet is being written survive into the next period.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::export::{Artifact, ExportError, ReportExporter};
use crate::notify::{ReportEvent, publish};
use crate::store::{SharedStore, lock_store};
use crate::types::RecordId;

/// Default rollover period (24 hours).
pub const DEFAULT_ROLLOVER_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Whether a rollover clears the report when its export failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Clear regardless of the export outcome.
    #[default]
    Always,
    /// Clear only after a successful export.
    OnExportSuccess,
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverState {
    /// Timer armed, waiting for the next period.
    Idle,
    /// Export and clear in progress.
    Firing,
}

/// Everything a rollover needs.
#[derive(Debug, Clone)]
pub struct RolloverContext {
    pub store: SharedStore,
    pub exporter: ReportExporter,
    pub events: broadcast::Sender<ReportEvent>,
    pub policy: ClearPolicy,
}

/// Result of a single rollover.
#[derive(Debug)]
pub struct RolloverOutcome {
    /// Number of records handed to the exporter.
    pub exported_records: usize,
    /// What the exporter produced.
    pub export: Result<Artifact, ExportError>,
    /// Number of records removed from the store.
    pub cleared: usize,
}

/// Runs one rollover: export a snapshot, then remove the snapshot's records
/// according to the clear policy.
pub async fn rollover_once(ctx: &RolloverContext) -> RolloverOutcome {
    let snapshot = lock_store(&ctx.store).list();
    let ids: Vec<RecordId> = snapshot.iter().map(|r| r.id.clone()).collect();
    let exported_records = snapshot.len();

    let export = ctx.exporter.export(snapshot).await;
    if let Err(e) = &export {
        tracing::warn!(error = %e, policy = ?ctx.policy, "rollover export failed");
        publish(
            &ctx.events,
            ReportEvent::ExportFailed {
                reason: e.to_string(),
            },
        );
    }

    let should_clear = export.is_ok() || ctx.policy == ClearPolicy::Always;
    let cleared = if should_clear {
        let mut store = lock_store(&ctx.store);
        let before = store.len();
        if let Err(e) = store.remove(&ids) {
            tracing::warn!(error = %e, "rollover clear was not mirrored");
        }
        before - store.len()
    } else {
        0
    };

    tracing::info!(
        exported = export.is_ok(),
        records = exported_records,
        cleared,
        "rollover completed"
    );
    publish(
        &ctx.events,
        ReportEvent::RolloverCompleted {
            exported: export.is_ok(),
            cleared,
        },
    );

    RolloverOutcome {
        exported_records,
        export,
        cleared,
    }
}

/// Periodic export-then-clear timer.
#[derive(Debug)]
pub struct RolloverScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    state: watch::Receiver<RolloverState>,
}

impl RolloverScheduler {
    /// Arms the timer. Must be called from within a tokio runtime.
    pub fn start(ctx: RolloverContext, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(RolloverState::Idle);
        let handle = tokio::spawn(run(ctx, period, cancel.clone(), state_tx));
        tracing::debug!(period_secs = period.as_secs(), "rollover scheduler armed");

        Self {
            cancel,
            handle,
            state: state_rx,
        }
    }

    pub fn state(&self) -> RolloverState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<RolloverState> {
        self.state.clone()
    }

    /// Disarms the pending timer. A firing already in progress completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels and waits for the scheduler task to finish.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        self.cancel();
        self.handle.await
    }
}

async fn run(
    ctx: RolloverContext,
    period: Duration,
    cancel: CancellationToken,
    state: watch::Sender<RolloverState>,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }

        state.send_replace(RolloverState::Firing);
        rollover_once(&ctx).await;
        state.send_replace(RolloverState::Idle);
    }
    tracing::debug!("rollover scheduler stopped");
}
