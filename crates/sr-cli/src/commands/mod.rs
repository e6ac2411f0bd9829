//! CLI subcommand implementations.

pub mod clear;
pub mod export;
pub mod remark;
pub mod report;
pub mod status;
pub mod util;
pub mod watch;
