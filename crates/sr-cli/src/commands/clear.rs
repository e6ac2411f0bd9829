//! Clear command for emptying the report.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;
use crate::commands::util::{lock_report, open_engine};

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<usize> {
    let _lock = lock_report(config)?;
    let mut engine = open_engine(config, None)?;
    let removed = engine.clear().context("failed to clear report")?;
    writeln!(writer, "Cleared {removed} records")?;
    Ok(removed)
}
