//! Run command implementation.

use crate::core::config::{Config, ConfigOverrides};
use crate::core::runtime::Harness;
use crate::ops::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

/// Run the check plugins.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Use a remote timestamp oracle at this base URL.
    #[arg(long)]
    pub oracle_endpoint: Option<String>,
}

/// Load the config file, or defaults when it does not exist.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = if path.exists() {
        Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?
    } else {
        Config::default()
    };
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Run the harness with the given config path.
pub async fn run_harness(
    config_path: &Path,
    log_level: Option<String>,
    args: RunArgs,
) -> Result<()> {
    let overrides = ConfigOverrides {
        log_level,
        oracle_endpoint: args.oracle_endpoint,
    };
    let config = load_config(config_path, &overrides)?;
    init_tracing(&config.telemetry.log_level);

    let harness = Harness::new(config)?;
    harness
        .run_until_signal()
        .await
        .context("consistency run failed")
}
