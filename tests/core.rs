//! Core infrastructure tests.

mod common;

use common::{CountingPlugin, FailingPlugin};
use crosscheck::core::config::{Config, ConfigOverrides};
use crosscheck::core::error::{CheckError, StaleSnapshotError};
use crosscheck::core::runtime::{build_oracle, Harness};
use crosscheck::core::time::Timestamp;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Config tests
// ============================================================================

#[test]
fn parse_minimal_config() {
    let file = common::create_minimal_config();
    let config = common::load_config(&file);
    assert_eq!(config.oracle.mode, "local");
    assert!(config.probe.enabled);
    assert_eq!(config.telemetry.log_level, "info");
}

#[test]
fn parse_full_config() {
    let file = common::write_config(
        r#"
[oracle]
mode = "remote"
endpoint = "http://tso.local:9123"
request_timeout_ms = 750

[scheduler]
report_interval_ms = 2500
shutdown_grace_ms = 100

[probe]
enabled = false
floor_lag_ms = 250
round_interval_ms = 0

[telemetry]
log_level = "debug"
"#,
    );
    let config = common::load_config(&file);
    assert!(config.oracle.is_remote());
    assert_eq!(config.oracle.endpoint.as_deref(), Some("http://tso.local:9123"));
    assert_eq!(config.oracle.request_timeout(), Duration::from_millis(750));
    assert_eq!(config.scheduler.report_interval(), Duration::from_millis(2500));
    assert!(!config.probe.enabled);
    assert_eq!(config.probe.floor_lag_ms, 250);
    assert_eq!(config.telemetry.log_level, "debug");
}

#[test]
fn validate_remote_requires_endpoint() {
    let file = common::write_config(
        r#"
[oracle]
mode = "remote"
"#,
    );
    let err = Config::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("oracle.endpoint"));
}

#[test]
fn validate_remote_rejects_tls_endpoint() {
    let result = Config::from_toml(
        r#"
[oracle]
mode = "remote"
endpoint = "https://tso.local:9123"
"#,
    );
    let err = common::assert_err(result);
    assert!(format!("{:#}", err).contains("http://"));
}

#[test]
fn validate_unknown_oracle_mode() {
    let result = Config::from_toml("[oracle]\nmode = \"gossip\"\n");
    assert!(result.is_err());
}

#[test]
fn validate_invalid_log_level() {
    let result = Config::from_toml("[telemetry]\nlog_level = \"loud\"\n");
    assert!(result.is_err());
}

#[test]
fn validate_serve_bind_is_local_only() {
    let result = Config::from_toml(
        r#"
[oracle]
mode = "remote"
endpoint = "http://tso:9123"
serve_bind = "127.0.0.1:9123"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::from_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn overrides_switch_to_remote_oracle() {
    let mut config = Config::default();
    config.apply_overrides(&ConfigOverrides {
        log_level: Some("warn".to_string()),
        oracle_endpoint: Some("http://10.0.0.1:9123".to_string()),
    });
    assert!(config.oracle.is_remote());
    assert_eq!(config.telemetry.log_level, "warn");
    config.validate().unwrap();
}

#[test]
fn build_oracle_follows_mode() {
    let local = build_oracle(&Config::default()).unwrap();
    assert_eq!(local.kind(), "local");

    let mut config = Config::default();
    config.apply_overrides(&ConfigOverrides {
        log_level: None,
        oracle_endpoint: Some("http://127.0.0.1:1".to_string()),
    });
    let remote = build_oracle(&config).unwrap();
    assert_eq!(remote.kind(), "remote");
}

// ============================================================================
// Error rendering tests
// ============================================================================

#[test]
fn violation_message_lists_every_account() {
    let violation = common::sample_violation();
    assert_eq!(
        violation.to_string(),
        "Inconsistency Detected!\na1: 10\na2: 20\nRead with ts: 42, expect: 50, actual: 30"
    );
    let err = CheckError::from(violation);
    assert!(err.is_violation());
    assert!(!err.is_retriable());
}

#[test]
fn stale_snapshot_message() {
    let err = CheckError::from(StaleSnapshotError {
        ts: Timestamp::from_raw(7),
    });
    assert_eq!(err.to_string(), "Snapshot too old: 7");
    assert!(err.is_retriable());
}

// ============================================================================
// Harness tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn harness_probe_runs_until_shutdown() {
    let harness = Arc::new(Harness::new(common::local_config(true)).unwrap());
    assert_eq!(harness.plugin_names(), vec!["tso-probe".to_string()]);

    let run = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.run().await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = harness.shutdown_handle().send(true);

    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("harness did not stop")
        .unwrap()
        .unwrap();

    // The probe pushed the floor off zero.
    assert!(harness.floor().read() > Timestamp::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn harness_surfaces_plugin_failure() {
    let mut harness = Harness::new(common::local_config(false)).unwrap();
    harness.register(Arc::new(CountingPlugin::new(
        "healthy",
        Duration::from_millis(1),
    )));
    harness.register(Arc::new(FailingPlugin::new("broken", 1)));

    let err = tokio::time::timeout(Duration::from_secs(5), harness.run())
        .await
        .expect("harness did not stop")
        .unwrap_err();
    let check = err.downcast_ref::<CheckError>().expect("not a CheckError");
    assert!(check.is_violation());
}

#[tokio::test]
async fn harness_without_plugins_returns_immediately() {
    let harness = Harness::new(common::local_config(false)).unwrap();
    assert!(harness.plugin_names().is_empty());
    tokio::time::timeout(Duration::from_secs(5), harness.run())
        .await
        .expect("harness did not stop")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn harness_serves_its_oracle() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = common::local_config(false);
    config.oracle.serve_bind = Some(addr.to_string());
    let mut harness = Harness::new(config).unwrap();
    harness.register(Arc::new(CountingPlugin::new(
        "idle",
        Duration::from_millis(5),
    )));
    let harness = Arc::new(harness);

    let run = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.run().await })
    };

    let remote = crosscheck::RemoteOracle::new(format!("http://{}", addr)).unwrap();
    let mut drawn = None;
    for _ in 0..50 {
        if let Ok(ts) = crosscheck::TimestampOracle::next(&remote).await {
            drawn = Some(ts);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let drawn = drawn.expect("timestamp service never answered");
    let epoch = harness.oracle().start().await.unwrap();
    assert!(drawn > epoch);

    harness.shutdown();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("harness did not stop")
        .unwrap()
        .unwrap();
}
