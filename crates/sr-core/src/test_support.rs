//! Writers and mirrors used by unit tests.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

use crate::export::{Artifact, Table, TabularWriter, WriterError};
use crate::store::{Mirror, MirrorError};

/// Keeps every table it is asked to write.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    tables: Arc<Mutex<Vec<Table>>>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TabularWriter for RecordingWriter {
    fn write(&self, table: &Table) -> Result<Artifact, WriterError> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(table.clone());
        Ok(Artifact {
            path: PathBuf::from("memory://report"),
            rows: table.rows.len(),
        })
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingWriter;

impl TabularWriter for FailingWriter {
    fn write(&self, _table: &Table) -> Result<Artifact, WriterError> {
        Err(WriterError::new("disk full"))
    }
}

/// Blocks inside `write` until the test releases it.
pub struct GatedWriter {
    started: Sender<()>,
    release: Mutex<Receiver<()>>,
}

/// Test-side handle of a [`GatedWriter`].
pub struct Gate {
    started: Receiver<()>,
    release: Sender<()>,
}

impl GatedWriter {
    pub fn new() -> (Self, Gate) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                started: started_tx,
                release: Mutex::new(release_rx),
            },
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl TabularWriter for GatedWriter {
    fn write(&self, table: &Table) -> Result<Artifact, WriterError> {
        let _ = self.started.send(());
        let _ = self
            .release
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        Ok(Artifact {
            path: PathBuf::from("memory://gated"),
            rows: table.rows.len(),
        })
    }
}

impl Gate {
    /// Blocks until the writer has entered `write`.
    pub fn wait_until_writing(&self) {
        self.started.recv().unwrap();
    }

    pub fn release(&self) {
        self.release.send(()).unwrap();
    }
}

/// Starts empty and refuses every write.
#[derive(Debug, Clone, Copy)]
pub struct ReadOnlyMirror;

impl Mirror for ReadOnlyMirror {
    fn load(&self) -> Result<Option<String>, MirrorError> {
        Ok(None)
    }

    fn save(&self, _contents: &str) -> Result<(), MirrorError> {
        Err(MirrorError::new("read-only file system"))
    }
}
