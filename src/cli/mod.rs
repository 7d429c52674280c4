//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// crosscheck - continuous consistency-check harness.
#[derive(Parser, Debug)]
#[command(name = "crosscheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the check plugins until interrupted or a check fails.
    Run(commands::RunArgs),
    /// Timestamp oracle operations.
    Oracle(commands::OracleArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}
