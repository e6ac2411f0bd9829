//! Shared utilities for CLI commands.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use sr_core::{Engine, ReportExporter, ReportStore};
use sr_db::SqliteMirror;
use sr_xlsx::XlsxWriter;

use crate::Config;

fn ensure_database_dir(config: &Config) -> Result<()> {
    if let Some(parent) = config
        .database_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Ok(())
}

/// Opens the report store, creating the database directory if needed.
pub fn open_store(config: &Config) -> Result<ReportStore> {
    ensure_database_dir(config)?;
    let mirror = SqliteMirror::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok(ReportStore::open(mirror))
}

/// Builds the spreadsheet exporter, optionally overriding the export directory.
pub fn exporter(config: &Config, export_dir: Option<&Path>) -> ReportExporter {
    let dir = export_dir.unwrap_or(&config.export_dir);
    ReportExporter::new(XlsxWriter::new(dir, config.export_file_name.clone()))
}

/// Opens the store and wraps it in an engine configured from `config`.
pub fn open_engine(config: &Config, export_dir: Option<&Path>) -> Result<Engine> {
    let store = open_store(config)?;
    Ok(Engine::new(store, exporter(config, export_dir))
        .with_telemetry_capacity(config.telemetry_capacity))
}

/// Exclusive claim on the report database.
///
/// A running `sr watch` keeps the whole report in memory and rewrites the
/// database on every change, so any other writer would be silently undone.
/// The watcher and every one-shot command that mutates the report take this
/// lock; the OS releases it when the holder exits, even on a crash.
#[derive(Debug)]
pub struct ReportLock {
    _file: File,
}

fn lock_path(config: &Config) -> PathBuf {
    let mut path = config.database_path.clone().into_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

/// Takes the report lock without waiting.
///
/// Fails with a readable error if another process (typically `sr watch`) holds it.
pub fn lock_report(config: &Config) -> Result<ReportLock> {
    ensure_database_dir(config)?;
    let file = File::create(lock_path(config)).context("failed to create lock file")?;
    if let Err(e) = file.try_lock_exclusive() {
        if e.kind() == fs2::lock_contended_error().kind() {
            bail!(
                "report {} is in use by another sr process (is `sr watch` running?); stop it and retry",
                config.database_path.display()
            );
        }
        return Err(e).context("failed to acquire report lock");
    }
    Ok(ReportLock { _file: file })
}
