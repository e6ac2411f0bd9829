//! Report export.
//!
//! The exporter turns records into a [`Table`] and hands it to a
//! [`TabularWriter`], which owns the actual file encoding. Writers run on the
//! blocking pool so callers keep ingesting events while a file is written.
//!
//! Exporting never mutates the report store; clearing is always a separate step.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::record::StoppageRecord;

/// Column headers of the exported sheet, in order.
pub const EXPORT_HEADERS: [&str; 6] = ["S.No", "ID", "Date", "Time", "Stoppage Time", "Remarks"];

/// One cell of an exported row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Integer(u64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Header row plus one row per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds the export table for `records`, numbering rows from 1 by position.
    pub fn from_records(records: &[StoppageRecord]) -> Self {
        let rows = (1u64..)
            .zip(records)
            .map(|(serial, record)| {
                vec![
                    Cell::Integer(serial),
                    Cell::Text(record.id.to_string()),
                    Cell::Text(record.date.clone()),
                    Cell::Text(record.time.clone()),
                    Cell::Text(record.stoppage_time_display.clone()),
                    Cell::Text(record.remarks.clone()),
                ]
            })
            .collect();

        Self {
            headers: EXPORT_HEADERS.iter().map(ToString::to_string).collect(),
            rows,
        }
    }
}

/// A file produced by a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Where the file was written.
    pub path: PathBuf,
    /// Number of data rows, excluding the header.
    pub rows: usize,
}

/// A tabular writer failure.
#[derive(Debug, Error)]
#[error("tabular writer failed: {0}")]
pub struct WriterError(#[source] Box<dyn StdError + Send + Sync>);

impl WriterError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Encodes a table into a downloadable file.
pub trait TabularWriter: Send + Sync {
    fn write(&self, table: &Table) -> Result<Artifact, WriterError>;
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The writer reported a failure.
    #[error("export failed: {0}")]
    Failed(#[from] WriterError),
    /// The blocking worker panicked or was cancelled.
    #[error("export worker did not complete: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Converts report records into a table and writes it out.
#[derive(Clone)]
pub struct ReportExporter {
    writer: Arc<dyn TabularWriter>,
}

impl fmt::Debug for ReportExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportExporter").finish_non_exhaustive()
    }
}

impl ReportExporter {
    pub fn new(writer: impl TabularWriter + 'static) -> Self {
        Self {
            writer: Arc::new(writer),
        }
    }

    /// Writes `records` through the writer on the blocking pool.
    pub async fn export(&self, records: Vec<StoppageRecord>) -> Result<Artifact, ExportError> {
        let writer = Arc::clone(&self.writer);
        let count = records.len();
        let artifact = tokio::task::spawn_blocking(move || {
            let table = Table::from_records(&records);
            writer.write(&table)
        })
        .await??;

        tracing::info!(path = %artifact.path.display(), rows = count, "report exported");
        Ok(artifact)
    }
}
