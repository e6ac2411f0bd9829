use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sr_cli::commands::{clear, export, remark, report, status, watch};
use sr_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut stdout = std::io::stdout();
    match &cli.command {
        Some(Commands::Watch(args)) => {
            let config = load_config(cli.config.as_deref())?;
            runtime()?.block_on(watch::run(&mut stdout, args, &config))?;
        }
        Some(Commands::Report { json }) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(&mut stdout, &config, *json)?;
        }
        Some(Commands::Export(args)) => {
            let config = load_config(cli.config.as_deref())?;
            runtime()?.block_on(export::run(&mut stdout, args, &config))?;
        }
        Some(Commands::Clear) => {
            let config = load_config(cli.config.as_deref())?;
            clear::run(&mut stdout, &config)?;
        }
        Some(Commands::Remark(args)) => {
            let config = load_config(cli.config.as_deref())?;
            remark::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent).context("failed to create database directory")?;
            }
            status::run(&mut stdout, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
