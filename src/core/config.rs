//! Configuration parsing and validation.
//!
//! Configuration is loaded from a TOML file with CLI overrides. Every
//! section is optional; an empty file runs a local oracle with the built-in
//! probe plugin.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Timestamp oracle configuration.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Plugin scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Built-in oracle probe plugin.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Timestamp oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Mode: "local" or "remote".
    #[serde(default = "default_oracle_mode")]
    pub mode: String,

    /// Base URL of the remote authority (remote mode).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Serve the local oracle over HTTP on this address (local mode).
    #[serde(default)]
    pub serve_bind: Option<String>,

    /// Per-request timeout for the remote client in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            mode: default_oracle_mode(),
            endpoint: None,
            serve_bind: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl OracleConfig {
    /// Whether timestamps come from a remote authority.
    pub fn is_remote(&self) -> bool {
        self.mode == "remote"
    }

    /// Remote request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Plugin scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between round-count reports in milliseconds.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// How long to wait for the embedded oracle server to stop.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            report_interval_ms: default_report_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl SchedulerConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Built-in oracle probe plugin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Register the probe with the scheduler.
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,

    /// How far the proposed floor trails each drawn timestamp, in milliseconds.
    #[serde(default = "default_floor_lag_ms")]
    pub floor_lag_ms: u64,

    /// Pause between probe rounds in milliseconds.
    #[serde(default = "default_round_interval_ms")]
    pub round_interval_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            floor_lag_ms: default_floor_lag_ms(),
            round_interval_ms: default_round_interval_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_oracle_mode() -> String {
    "local".to_string()
}

fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_report_interval_ms() -> u64 {
    10_000
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

fn default_probe_enabled() -> bool {
    true
}

fn default_floor_lag_ms() -> u64 {
    1_000
}

fn default_round_interval_ms() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(ref endpoint) = overrides.oracle_endpoint {
            self.oracle.mode = "remote".to_string();
            self.oracle.endpoint = Some(endpoint.clone());
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_oracle()?;
        self.validate_scheduler()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_oracle(&self) -> Result<()> {
        let oracle = &self.oracle;
        if oracle.mode != "local" && oracle.mode != "remote" {
            anyhow::bail!(
                "oracle.mode must be 'local' or 'remote', got: {}",
                oracle.mode
            );
        }

        if oracle.is_remote() {
            match oracle.endpoint.as_deref().map(str::trim) {
                None | Some("") => anyhow::bail!("oracle.endpoint required for remote mode"),
                Some(endpoint) => {
                    if !endpoint.starts_with("http://") {
                        anyhow::bail!(
                            "oracle.endpoint must be a plain http:// URL, got: {}",
                            endpoint
                        );
                    }
                }
            }
            if oracle.serve_bind.is_some() {
                anyhow::bail!("oracle.serve_bind is only valid in local mode");
            }
        }

        if let Some(ref bind) = oracle.serve_bind {
            bind.parse::<std::net::SocketAddr>()
                .with_context(|| format!("oracle.serve_bind is not a socket address: {}", bind))?;
        }

        if oracle.request_timeout_ms == 0 {
            anyhow::bail!("oracle.request_timeout_ms must be > 0");
        }

        Ok(())
    }

    fn validate_scheduler(&self) -> Result<()> {
        if self.scheduler.report_interval_ms == 0 {
            anyhow::bail!("scheduler.report_interval_ms must be > 0");
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Switch to a remote oracle at this URL.
    pub oracle_endpoint: Option<String>,
}
