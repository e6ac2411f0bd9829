//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::export::ExportArgs;
use crate::commands::remark::RemarkArgs;
use crate::commands::watch::WatchArgs;

/// Stoppage tracker.
///
/// Turns a stream of moving/stopped events into an annotated stoppage report
/// and exports it as a spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "sr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest NDJSON status events until end of input or Ctrl-C.
    Watch(WatchArgs),

    /// Print the stoppage report.
    Report {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write the report to a spreadsheet. The report is left unchanged.
    Export(ExportArgs),

    /// Remove every record from the report.
    Clear,

    /// Set the remarks of a record.
    Remark(RemarkArgs),

    /// Show report status.
    Status,
}
