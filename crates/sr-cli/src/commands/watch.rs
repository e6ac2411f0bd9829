//! Watch command: ingest status events and keep the rollover timer armed.
//!
//! Events are read as newline-delimited JSON, one object per line, from stdin
//! or a file. Invalid lines are logged and skipped. The command stops at end
//! of input or on Ctrl-C, then disarms the rollover scheduler.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sr_core::{Engine, MotionStatus, ReportEvent, RolloverScheduler, StatusEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::Config;
use crate::commands::util::{lock_report, open_engine};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Read events from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the rollover period, in seconds.
    #[arg(long)]
    pub rollover_secs: Option<u64>,
}

/// What a watch session processed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    /// Valid events ingested.
    pub events: usize,
    /// Lines that were not valid status events.
    pub skipped: usize,
    /// Record changes the events produced.
    pub changes: usize,
    /// Status of the last ingested event.
    pub last_status: Option<MotionStatus>,
}

pub async fn run<W: Write>(writer: &mut W, args: &WatchArgs, config: &Config) -> Result<WatchSummary> {
    // Held for the whole session; one-shot writers refuse while it is taken.
    let _lock = lock_report(config)?;
    let mut engine = open_engine(config, None)?;
    let period = args
        .rollover_secs
        .map_or_else(|| config.rollover_period(), |secs| Duration::from_secs(secs.max(1)));

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let scheduler =
        RolloverScheduler::start(engine.rollover_context(config.clear_policy), period);
    let logger = tokio::spawn(log_notifications(engine.subscribe()));

    tracing::info!(period_secs = period.as_secs(), "watching for status events");
    let summary = ingest_lines(reader, &mut engine, interrupted()).await;

    scheduler
        .shutdown()
        .await
        .context("rollover scheduler failed")?;
    let records = engine.list().len();
    // Dropping the last sender ends the notification logger.
    drop(engine);
    if let Err(e) = logger.await {
        tracing::warn!(error = %e, "notification logger failed");
    }

    let summary = summary?;
    writeln!(
        writer,
        "Ingested {} events ({} skipped), {} records in report",
        summary.events, summary.skipped, records
    )?;
    Ok(summary)
}

/// Feeds every line of `reader` to the engine until end of input or `shutdown`.
pub async fn ingest_lines<R, F>(reader: R, engine: &mut Engine, shutdown: F) -> Result<WatchSummary>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let mut segments = reader.split(b'\n');
    let mut summary = WatchSummary::default();
    let mut line_no = 0usize;
    tokio::pin!(shutdown);

    loop {
        let segment = tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("interrupted, stopping");
                break;
            }
            segment = segments.next_segment() => segment
                .with_context(|| format!("failed to read line {}", line_no + 1))?,
        };
        let Some(segment) = segment else {
            break;
        };
        line_no += 1;

        let Ok(line) = std::str::from_utf8(&segment) else {
            summary.skipped += 1;
            tracing::warn!(line = line_no, "skipping line that is not valid UTF-8");
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = match StatusEvent::from_json(trimmed) {
            Ok(event) => event,
            Err(e) => {
                summary.skipped += 1;
                tracing::warn!(line = line_no, error = %e, "skipping invalid event");
                continue;
            }
        };

        summary.events += 1;
        summary.last_status = Some(event.status);
        match engine.ingest(event) {
            Ok(Some(_)) => summary.changes += 1,
            Ok(None) => {}
            Err(e) => tracing::warn!(line = line_no, error = %e, "failed to apply stoppage change"),
        }
    }

    Ok(summary)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn log_notifications(mut rx: broadcast::Receiver<ReportEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "notification logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &ReportEvent) {
    match event {
        ReportEvent::RecordCreated(id) => tracing::info!(id = %id, "stoppage started"),
        ReportEvent::RecordClosed {
            id,
            stoppage_time_ms,
        } => tracing::info!(id = %id, stoppage_time_ms, "stoppage ended"),
        ReportEvent::RemarksUpdated(id) => tracing::info!(id = %id, "remarks updated"),
        ReportEvent::Cleared { removed } => tracing::info!(removed, "report cleared"),
        ReportEvent::Exported(artifact) => {
            tracing::info!(path = %artifact.path.display(), rows = artifact.rows, "report exported");
        }
        ReportEvent::ExportFailed { reason } => tracing::warn!(reason, "export failed"),
        ReportEvent::RolloverCompleted { exported, cleared } => {
            tracing::info!(exported, cleared, "rollover completed");
        }
    }
}
