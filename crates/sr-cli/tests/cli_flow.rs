//! End-to-end tests for the stoppage report flow.
//!
//! Tests the full pipeline: watch → report → remark → export → clear
//! by driving the `sr` binary against a temporary database.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn sr_binary() -> String {
    env!("CARGO_BIN_EXE_sr").to_string()
}

/// Temp workspace with a config file pointing at a private database.
struct Workspace {
    temp: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        let db_path = temp.path().join("sr.db");
        let export_dir = temp.path().join("exports");
        std::fs::write(
            &config,
            format!(
                "database_path = \"{}\"\nexport_dir = \"{}\"\n",
                db_path.display(),
                export_dir.display()
            ),
        )
        .unwrap();
        Self { temp, config }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn sr(&self, args: &[&str]) -> Output {
        Command::new(sr_binary())
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .output()
            .expect("failed to run sr")
    }

    fn sr_ok(&self, args: &[&str]) -> String {
        let output = self.sr(args);
        assert!(
            output.status.success(),
            "sr {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn report(&self) -> Vec<serde_json::Value> {
        serde_json::from_str(&self.sr_ok(&["report", "--json"])).unwrap()
    }

    fn watch_file(&self, events: &str) -> String {
        let input = self.path().join("events.ndjson");
        std::fs::write(&input, events).unwrap();
        self.sr_ok(&["watch", "--input", input.to_str().unwrap()])
    }
}

const ONE_STOPPAGE: &str = r#"{"isMoving":"Moving","timestamp":1737979195000}
{"isMoving":"Stopped","timestamp":1737979200000}
{"isMoving":"Stopped","timestamp":1737979201000}
{"isMoving":"Moving","timestamp":1737979290000}
"#;

#[test]
fn test_watch_records_stoppage_from_file() {
    let ws = Workspace::new();

    let stdout = ws.watch_file(ONE_STOPPAGE);
    assert_eq!(
        stdout.trim(),
        "Ingested 4 events (0 skipped), 1 records in report"
    );

    let records = ws.report();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stoppageTimeMs"], 90_000);
    assert_eq!(records[0]["stoppageTimeDisplay"], "1.50 min");
    assert_eq!(records[0]["remarks"], "");
}

#[test]
fn test_watch_from_stdin_skips_invalid_lines() {
    let ws = Workspace::new();

    let mut child = Command::new(sr_binary())
        .arg("--config")
        .arg(&ws.config)
        .arg("watch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn sr watch");
    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin
            .write_all(b"{\"isMoving\":\"Stopped\",\"timestamp\":1737979200000}\n{oops\n")
            .unwrap();
    }
    let output = child.wait_with_output().unwrap();

    assert!(
        output.status.success(),
        "watch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ingested 1 events (1 skipped)"));

    // The stoppage is still open when input ends.
    let records = ws.report();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stoppageTimeMs"], 0);
}

#[test]
fn test_records_accumulate_across_watch_sessions() {
    let ws = Workspace::new();
    ws.watch_file(ONE_STOPPAGE);
    ws.watch_file(ONE_STOPPAGE);

    let records = ws.report();
    assert_eq!(records.len(), 2);
    assert_ne!(records[0]["id"], records[1]["id"]);
}

#[test]
fn test_remark_export_clear_flow() {
    let ws = Workspace::new();
    ws.watch_file(ONE_STOPPAGE);
    let id = ws.report()[0]["id"].as_str().unwrap().to_string();

    let stdout = ws.sr_ok(&["remark", &id, "conveyor jam"]);
    assert_eq!(stdout.trim(), format!("Updated remarks for {id}"));
    assert_eq!(ws.report()[0]["remarks"], "conveyor jam");

    // Remarks are write-once unless forced.
    let refused = ws.sr(&["remark", &id, "something else"]);
    assert!(!refused.status.success());
    assert_eq!(ws.report()[0]["remarks"], "conveyor jam");

    let stdout = ws.sr_ok(&["export"]);
    let exported = ws.path().join("exports").join("data.xlsx");
    assert!(stdout.contains("Exported 1 records"));
    assert!(exported.is_file());
    assert_eq!(ws.report().len(), 1, "export must not clear the report");

    let stdout = ws.sr_ok(&["clear"]);
    assert_eq!(stdout.trim(), "Cleared 1 records");
    assert!(ws.report().is_empty());
}

#[test]
fn test_remark_unknown_record_fails() {
    let ws = Workspace::new();
    let output = ws.sr(&["remark", "no-such-id", "x"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("record not found: no-such-id"));
}

#[test]
fn test_status_and_human_report() {
    let ws = Workspace::new();
    let stdout = ws.sr_ok(&["status"]);
    assert!(stdout.contains("No stoppages recorded."));

    ws.watch_file(ONE_STOPPAGE);
    let stdout = ws.sr_ok(&["status"]);
    assert!(stdout.contains("Records: 1 (0 open)"));

    let stdout = ws.sr_ok(&["report"]);
    assert!(stdout.starts_with("STOPPAGE REPORT\n"));
    assert!(stdout.contains("1 stoppage, 0 open, total 1.50 min"));
}

#[test]
fn test_missing_input_file_fails() {
    let ws = Workspace::new();
    let missing = ws.path().join("missing.ndjson");
    let output = ws.sr(&["watch", "--input", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open"));
}
