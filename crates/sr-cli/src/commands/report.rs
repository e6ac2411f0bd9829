//! Report command for printing the stored stoppage records.
//!
//! Implements `sr report` in a human-readable layout or as JSON (`--json`).

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use sr_core::{StoppageRecord, format_stoppage};

use crate::Config;
use crate::commands::util::open_store;

/// Formats the human-readable report output.
pub fn format_report(records: &[StoppageRecord]) -> String {
    let mut output = String::new();

    writeln!(output, "STOPPAGE REPORT").unwrap();
    writeln!(output, "───────────────").unwrap();

    if records.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No stoppages recorded.").unwrap();
        return output;
    }

    for (serial, record) in (1..).zip(records) {
        let duration = if record.is_closed() {
            record.stoppage_time_display.as_str()
        } else {
            "(open)"
        };
        writeln!(
            output,
            "{serial:>3}. {} {}  {duration}",
            record.date, record.time
        )
        .unwrap();
        writeln!(output, "     id: {}", record.id).unwrap();
        if !record.remarks.is_empty() {
            writeln!(output, "     remarks: {}", record.remarks).unwrap();
        }
    }

    let open = records.iter().filter(|r| !r.is_closed()).count();
    let total_ms: i64 = records.iter().map(|r| r.stoppage_time_ms).sum();
    let noun = if records.len() == 1 {
        "stoppage"
    } else {
        "stoppages"
    };
    writeln!(output).unwrap();
    writeln!(
        output,
        "{} {noun}, {open} open, total {}",
        records.len(),
        format_stoppage(total_ms)
    )
    .unwrap();

    output
}

/// Formats records as a JSON array, in the same shape as the stored mirror.
pub fn format_report_json(records: &[StoppageRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let records = open_store(config)?.list();

    if json {
        writeln!(writer, "{}", format_report_json(&records)?)?;
    } else {
        write!(writer, "{}", format_report(&records))?;
    }
    Ok(())
}
