//! Export command for writing the report to a spreadsheet.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sr_core::Artifact;

use crate::Config;
use crate::commands::util::open_engine;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Directory to write the spreadsheet to (defaults to `export_dir`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run<W: Write>(writer: &mut W, args: &ExportArgs, config: &Config) -> Result<Artifact> {
    let engine = open_engine(config, args.output.as_deref())?;
    let artifact = engine.export().await.context("failed to export report")?;
    writeln!(
        writer,
        "Exported {} records to {}",
        artifact.rows,
        artifact.path.display()
    )?;
    Ok(artifact)
}
