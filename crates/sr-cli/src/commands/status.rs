//! Status command for showing the state of the stored report.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sr_core::{MIRROR_KEY, ReportStore};
use sr_db::SqliteMirror;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let mirror = SqliteMirror::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let last_saved = mirror
        .database()
        .updated_at(MIRROR_KEY)
        .context("failed to read report timestamp")?;
    let store = ReportStore::open(mirror);

    writeln!(writer, "Stoppage report status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Export: {}", config.export_dir.join(&config.export_file_name).display())?;

    let records = store.records();
    if records.is_empty() {
        writeln!(writer, "No stoppages recorded.")?;
        return Ok(());
    }

    let open = records.iter().filter(|r| !r.is_closed()).count();
    writeln!(writer, "Records: {} ({open} open)", records.len())?;
    if let Some(saved) = last_saved {
        writeln!(writer, "Last saved: {}", format_saved(saved))?;
    }
    if let Some(latest) = records.last() {
        let state = if latest.is_closed() {
            latest.stoppage_time_display.as_str()
        } else {
            "open"
        };
        writeln!(
            writer,
            "Latest: {} {} ({state}) {}",
            latest.date, latest.time, latest.id
        )?;
    }

    Ok(())
}

fn format_saved(saved: DateTime<Utc>) -> String {
    saved.to_rfc3339_opts(SecondsFormat::Secs, true)
}
