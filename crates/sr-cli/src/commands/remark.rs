//! Remark command for annotating a stoppage record.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;
use sr_core::{RecordId, StoreError};

use crate::Config;
use crate::commands::util::{lock_report, open_engine};

#[derive(Debug, Args)]
pub struct RemarkArgs {
    /// Record ID to annotate.
    pub id: String,
    /// Remarks text.
    pub text: String,
    /// Replace remarks that are already set.
    #[arg(long)]
    pub force: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &RemarkArgs, config: &Config) -> Result<()> {
    let id = RecordId::new(args.id.trim()).context("invalid record id")?;
    let _lock = lock_report(config)?;
    let mut engine = open_engine(config, None)?;

    let current = match engine.begin_edit(&id) {
        Ok(current) => current,
        Err(StoreError::NotFound(_)) => bail!("record not found: {id}"),
        Err(e) => return Err(e.into()),
    };
    if !current.is_empty() && !args.force {
        bail!("record {id} already has remarks ({current:?}); use --force to replace them");
    }

    engine
        .commit_edit(&id, args.text.clone())
        .with_context(|| format!("failed to update remarks for {id}"))?;
    writeln!(writer, "Updated remarks for {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use sr_core::StoppageRecord;

    use sr_core::{MotionStatus, StatusEvent};

    use crate::commands::util::{open_engine, open_store, testing::temp_config};

    fn seed(config: &Config, id: &str) {
        let now = Utc::now();
        let mut store = open_store(config).unwrap();
        store
            .append(StoppageRecord::open(RecordId::new(id).unwrap(), now, &now))
            .unwrap();
    }

    fn args(id: &str, text: &str, force: bool) -> RemarkArgs {
        RemarkArgs {
            id: id.to_string(),
            text: text.to_string(),
            force,
        }
    }

    fn remarks(config: &Config, id: &str) -> String {
        open_store(config)
            .unwrap()
            .get(&RecordId::new(id).unwrap())
            .unwrap()
            .remarks
            .clone()
    }

    #[test]
    fn remark_sets_remarks() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp_config(temp.path());
        seed(&config, "rec-1");

        let mut output = Vec::new();
        run(&mut output, &args("rec-1", "belt jam", false), &config).unwrap();

        assert_eq!(remarks(&config, "rec-1"), "belt jam");
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Updated remarks for rec-1\n"
        );
    }

    #[test]
    fn remark_refuses_overwrite_without_force() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp_config(temp.path());
        seed(&config, "rec-1");
        run(&mut Vec::new(), &args("rec-1", "first", false), &config).unwrap();

        let err = run(&mut Vec::new(), &args("rec-1", "second", false), &config).unwrap_err();
        assert!(err.to_string().contains("already has remarks"));
        assert_eq!(remarks(&config, "rec-1"), "first");

        run(&mut Vec::new(), &args("rec-1", "second", true), &config).unwrap();
        assert_eq!(remarks(&config, "rec-1"), "second");
    }

    #[test]
    fn remark_rejects_missing_record() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp_config(temp.path());

        let err = run(&mut Vec::new(), &args("ghost", "x", false), &config).unwrap_err();
        assert!(err.to_string().contains("record not found: ghost"));
    }

    #[test]
    fn remark_rejects_blank_id() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp_config(temp.path());

        let err = run(&mut Vec::new(), &args("  ", "x", false), &config).unwrap_err();
        assert!(err.to_string().contains("invalid record id"));
    }

    #[test]
    fn remark_refused_while_watcher_holds_report() {
        let temp = tempfile::tempdir().unwrap();
        let config = temp_config(temp.path());

        // Stand-in for a live `sr watch`: lock held, report in memory.
        let lock = lock_report(&config).unwrap();
        let mut watcher = open_engine(&config, None).unwrap();
        watcher
            .ingest(StatusEvent::new(
                MotionStatus::Stopped,
                chrono::DateTime::from_timestamp_millis(1_737_979_200_000).unwrap(),
            ))
            .unwrap();
        let id = watcher.list()[0].id.to_string();

        let err = run(&mut Vec::new(), &args(&id, "jam", false), &config).unwrap_err();
        assert!(err.to_string().contains("in use by another sr process"));

        watcher
            .ingest(StatusEvent::new(
                MotionStatus::Moving,
                chrono::DateTime::from_timestamp_millis(1_737_979_201_000).unwrap(),
            ))
            .unwrap();
        drop(watcher);
        drop(lock);

        // Once the watcher is gone the remark lands and stays.
        run(&mut Vec::new(), &args(&id, "jam", false), &config).unwrap();
        let stored = open_store(&config).unwrap().list();
        assert_eq!(stored[0].remarks, "jam");
        assert_eq!(stored[0].stoppage_time_ms, 1_000);
    }
}
