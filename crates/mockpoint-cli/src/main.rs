//! Mockpoint CLI
//!
//! Edits a persisted mock rule file and checks which requests it would answer.
//!
//! Usage:
//!   mockpoint [--config <FILE>] [--store <FILE>] <COMMAND>

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Command;
use mockpoint::config::MockpointConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mockpoint rule file editor
#[derive(Parser, Debug)]
#[command(name = "mockpoint")]
#[command(author, version, about = "Manage ordered HTTP mock rules")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "MOCKPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Rule file to operate on (overrides `store_path` from the config)
    #[arg(short, long, env = "MOCKPOINT_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MockpointConfig::from_file(path)?,
        None => MockpointConfig::default(),
    };
    if let Some(store) = args.store {
        config.store_path = store;
    }

    init_tracing(&config.log_level);

    let stdout = std::io::stdout();
    commands::run(&args.command, &config, &mut stdout.lock())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
