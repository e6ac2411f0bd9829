//! Stoppage report CLI library.
//!
//! This crate provides the `sr` command-line interface over the report engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
