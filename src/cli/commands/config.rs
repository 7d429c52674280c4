//! Config command implementation.

use super::run::load_config;
use crate::core::config::ConfigOverrides;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::Path;

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print the effective configuration with defaults applied.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command.
pub fn run_config(config_path: &Path, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => {
            if !config_path.exists() {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            load_config(config_path, &ConfigOverrides::default())?;
            println!("✓ {} is valid", config_path.display());
            Ok(())
        }
        ConfigCommand::Show { format } => {
            let config = load_config(config_path, &ConfigOverrides::default())?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&config)?),
                _ => println!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(())
        }
    }
}
