//! crosscheck - unified CLI entrypoint.
//!
//! Usage:
//!   crosscheck run --config config/crosscheck.toml
//!   crosscheck run --oracle-endpoint http://tso:9123
//!   crosscheck oracle serve --bind 0.0.0.0:9123
//!   crosscheck oracle next --endpoint http://tso:9123
//!   crosscheck config validate --config config/crosscheck.toml

use anyhow::Result;
use clap::Parser;
use crosscheck::cli::commands::{run_config, run_harness, run_oracle};
use crosscheck::cli::{Cli, Commands};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/crosscheck.toml"));

    match cli.command {
        Commands::Run(args) => run_harness(&config_path, cli.log_level, args).await,
        Commands::Oracle(args) => run_oracle(args, cli.log_level).await,
        Commands::Config(args) => run_config(&config_path, args),
    }
}
