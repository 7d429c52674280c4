//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

use crosscheck::core::config::Config;
use crosscheck::{
    AccountBalance, CheckError, ConsistencyViolation, Plugin, RoundContext, RoundFuture, Timestamp,
};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Create a minimal valid configuration file.
pub fn create_minimal_config() -> NamedTempFile {
    let config_content = r#"
[oracle]
mode = "local"
"#;
    write_config(config_content)
}

/// Write arbitrary TOML into a temporary file.
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Load a configuration from a temporary file.
pub fn load_config(file: &NamedTempFile) -> Config {
    Config::from_file(file.path()).expect("Failed to load config")
}

/// Local-oracle configuration with the probe toggled and fast reporting.
pub fn local_config(probe_enabled: bool) -> Config {
    let mut config = Config::default();
    config.probe.enabled = probe_enabled;
    config.probe.round_interval_ms = 1;
    config.probe.floor_lag_ms = 5;
    config.scheduler.report_interval_ms = 20;
    config.scheduler.shutdown_grace_ms = 500;
    config
}

/// Plugin whose every round succeeds after an optional pause.
pub struct CountingPlugin {
    name: String,
    pause: Duration,
    rounds: AtomicU64,
}

impl CountingPlugin {
    pub fn new(name: &str, pause: Duration) -> Self {
        Self {
            name: name.to_string(),
            pause,
            rounds: AtomicU64::new(0),
        }
    }

    /// Rounds this plugin has started.
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }
}

impl Plugin for CountingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn round<'a>(&'a self, ctx: &'a RoundContext, _correlation_id: &'a str) -> RoundFuture<'a> {
        Box::pin(async move {
            self.rounds.fetch_add(1, Ordering::SeqCst);
            if !self.pause.is_zero() {
                ctx.pause(self.pause).await?;
            }
            Ok(())
        })
    }
}

/// Plugin that reports an inconsistency on round `fail_on` (1-based).
pub struct FailingPlugin {
    name: String,
    fail_on: u64,
    rounds: AtomicU64,
}

impl FailingPlugin {
    pub fn new(name: &str, fail_on: u64) -> Self {
        Self {
            name: name.to_string(),
            fail_on,
            rounds: AtomicU64::new(0),
        }
    }
}

impl Plugin for FailingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn round<'a>(&'a self, ctx: &'a RoundContext, _correlation_id: &'a str) -> RoundFuture<'a> {
        Box::pin(async move {
            let round = self.rounds.fetch_add(1, Ordering::SeqCst) + 1;
            if round >= self.fail_on {
                return Err(CheckError::from(sample_violation()));
            }
            ctx.pause(Duration::from_millis(5)).await
        })
    }
}

/// The two-account violation used across tests.
pub fn sample_violation() -> ConsistencyViolation {
    ConsistencyViolation::from_accounts(
        Timestamp::from_raw(42),
        vec![AccountBalance::new("a1", 10), AccountBalance::new("a2", 20)],
        50,
    )
}

/// Assert that a result is Ok and return the value.
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a result is Err and return the error.
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_minimal_config() {
        let file = create_minimal_config();
        let config = load_config(&file);
        assert_eq!(config.oracle.mode, "local");
    }

    #[test]
    fn test_local_config_is_valid() {
        assert_ok(local_config(true).validate());
    }

    #[test]
    fn test_sample_violation_sum() {
        let violation = sample_violation();
        assert_eq!(violation.sum, 30);
        assert_eq!(violation.expect, 50);
    }
}
