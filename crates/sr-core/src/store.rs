//! The report store: ordered, durable collection of stoppage records.
//!
//! # Persistence
//!
//! Every successful mutation rewrites the whole collection to a [`Mirror`] as
//! a JSON array stored under [`MIRROR_KEY`]. On open, the store rehydrates
//! from that mirror. Missing, unreadable or corrupt mirror data yields an
//! empty store; it is never fatal.
//!
//! # Thread Safety
//!
//! [`ReportStore`] itself is not synchronized. Components that touch it from
//! more than one task (the engine and the rollover scheduler) share it as a
//! [`SharedStore`], whose single mutex guards the whole collection. The lock
//! is only held for short, synchronous sections and never across an await.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::record::StoppageRecord;
use crate::types::RecordId;

/// Fixed key the serialized report is stored under.
pub const MIRROR_KEY: &str = "stoppage_report";

/// Report store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this ID is already present.
    #[error("duplicate record id: {0}")]
    DuplicateId(RecordId),
    /// No record with this ID exists.
    #[error("record not found: {0}")]
    NotFound(RecordId),
    /// The record's duration has already been stamped.
    #[error("record {0} is already closed")]
    AlreadyClosed(RecordId),
    /// The in-memory change was applied but could not be mirrored.
    #[error("failed to persist report: {0}")]
    Mirror(#[from] MirrorError),
}

/// A mirror backend failure.
#[derive(Debug, Error)]
#[error("mirror backend failed: {0}")]
pub struct MirrorError(#[source] Box<dyn StdError + Send + Sync>);

impl MirrorError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Durable copy of the report, keyed by a fixed storage key.
pub trait Mirror: Send {
    /// Returns the stored contents, or `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<String>, MirrorError>;

    /// Replaces the stored contents.
    fn save(&self, contents: &str) -> Result<(), MirrorError>;
}

/// In-process mirror. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryMirror {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mirror pre-seeded with raw contents.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// Current raw contents.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Mirror for MemoryMirror {
    fn load(&self) -> Result<Option<String>, MirrorError> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<(), MirrorError> {
        *self
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }
}

/// A partial update applied to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    /// Stamp the final duration. Allowed once per record.
    Close {
        stoppage_time_ms: i64,
        stoppage_time_display: String,
    },
    /// Replace the operator remarks.
    Remarks(String),
}

/// Store handle shared between the engine and background tasks.
pub type SharedStore = Arc<Mutex<ReportStore>>;

/// Locks a shared store, recovering the data if a previous holder panicked.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ReportStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Append-only, insertion-ordered collection of stoppage records.
pub struct ReportStore {
    records: Vec<StoppageRecord>,
    mirror: Box<dyn Mirror>,
}

impl fmt::Debug for ReportStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportStore")
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl ReportStore {
    /// Opens a store backed by `mirror`, rehydrating any mirrored records.
    pub fn open(mirror: impl Mirror + 'static) -> Self {
        let records = rehydrate(&mirror);
        tracing::debug!(records = records.len(), "report store opened");
        Self {
            records,
            mirror: Box::new(mirror),
        }
    }

    /// Opens an empty store backed by a fresh [`MemoryMirror`].
    pub fn in_memory() -> Self {
        Self::open(MemoryMirror::new())
    }

    /// Wraps the store for sharing across tasks.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Appends a record at the end.
    pub fn append(&mut self, record: StoppageRecord) -> Result<(), StoreError> {
        if self.position(&record.id).is_some() {
            return Err(StoreError::DuplicateId(record.id));
        }
        self.records.push(record);
        self.persist()
    }

    /// Applies `patch` to the record with `id` and returns the updated record.
    pub fn update(&mut self, id: &RecordId, patch: RecordPatch) -> Result<StoppageRecord, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let record = &mut self.records[index];

        match patch {
            RecordPatch::Close {
                stoppage_time_ms,
                stoppage_time_display,
            } => {
                if record.is_closed() {
                    return Err(StoreError::AlreadyClosed(id.clone()));
                }
                record.stoppage_time_ms = stoppage_time_ms;
                record.stoppage_time_display = stoppage_time_display;
            }
            RecordPatch::Remarks(text) => record.remarks = text,
        }

        let updated = record.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Snapshot of all records in insertion order.
    pub fn list(&self) -> Vec<StoppageRecord> {
        self.records.clone()
    }

    /// Borrowed view of all records in insertion order.
    pub fn records(&self) -> &[StoppageRecord] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&StoppageRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Removes every record. Returns how many were removed.
    pub fn clear(&mut self) -> Result<usize, StoreError> {
        let removed = self.records.len();
        self.records.clear();
        self.persist()?;
        Ok(removed)
    }

    /// Removes exactly the records whose IDs are listed, keeping the rest in
    /// order. Returns how many were removed.
    pub fn remove(&mut self, ids: &[RecordId]) -> Result<usize, StoreError> {
        let ids: HashSet<&RecordId> = ids.iter().collect();
        let before = self.records.len();
        self.records.retain(|r| !ids.contains(&r.id));
        let removed = before - self.records.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| &r.id == id)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records).map_err(MirrorError::new)?;
        self.mirror.save(&json)?;
        Ok(())
    }
}

/// Loads records from the mirror, degrading to an empty report on any problem.
fn rehydrate(mirror: &dyn Mirror) -> Vec<StoppageRecord> {
    let contents = match mirror.load() {
        Ok(Some(contents)) => contents,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read report mirror, starting empty");
            return Vec::new();
        }
    };

    let records: Vec<StoppageRecord> = match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "corrupted report mirror, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let total = records.len();
    let records: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if records.len() < total {
        tracing::warn!(
            dropped = total - records.len(),
            "report mirror contained duplicate ids, keeping first occurrences"
        );
    }
    records
}
