//! Plugin contract.
//!
//! A plugin is a named, repeatable check. The scheduler knows nothing about
//! what a round does; it only calls [`Plugin::round`] until the round fails
//! or the run is cancelled. Plugins are built outside the scheduler with
//! whatever shared handles they need, usually through [`PluginBuilder`].

use crate::check::floor::SnapshotLowerBound;
use crate::check::probe::OracleProbe;
use crate::core::config::ProbeConfig;
use crate::core::error::{CheckError, CheckResult};
use crate::core::shutdown::{self, ShutdownReceiver};
use crate::oracle::TimestampOracle;
use crate::ops::metrics::MetricsRegistry;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Boxed future returned by a round.
pub type RoundFuture<'a> = Pin<Box<dyn Future<Output = CheckResult<()>> + Send + 'a>>;

/// A repeatable check driven by the scheduler.
pub trait Plugin: Send + Sync {
    /// Stable name; used as the metrics key and the log label.
    fn name(&self) -> &str;

    /// Run one round.
    ///
    /// `correlation_id` is fixed for the lifetime of the plugin's loop.
    /// Long rounds should watch `ctx` and bail out with
    /// [`CheckError::Cancelled`] once it is cancelled; the scheduler never
    /// interrupts a round in progress.
    fn round<'a>(&'a self, ctx: &'a RoundContext, correlation_id: &'a str) -> RoundFuture<'a>;
}

/// Per-loop execution context handed to every round.
#[derive(Debug, Clone)]
pub struct RoundContext {
    plugin: String,
    correlation_id: String,
    cancel: ShutdownReceiver,
}

impl RoundContext {
    pub fn new(
        plugin: impl Into<String>,
        correlation_id: impl Into<String>,
        cancel: ShutdownReceiver,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            correlation_id: correlation_id.into(),
            cancel,
        }
    }

    /// Name of the plugin this context belongs to.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Correlation id of the loop.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Whether the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        shutdown::is_requested(&self.cancel)
    }

    /// Resolve once the run is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        shutdown::requested(&mut rx).await;
    }

    /// Sleep for `duration`, or fail early with `Cancelled`.
    pub async fn pause(&self, duration: Duration) -> CheckResult<()> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(CheckError::Cancelled),
        }
    }
}

/// Carries the shared handles plugins are built from.
///
/// Each setter returns an updated copy so one partially filled builder can
/// seed several plugins.
#[derive(Clone, Default)]
pub struct PluginBuilder {
    oracle: Option<Arc<dyn TimestampOracle>>,
    floor: Option<Arc<SnapshotLowerBound>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl PluginBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oracle(mut self, oracle: Arc<dyn TimestampOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn floor(mut self, floor: Arc<SnapshotLowerBound>) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared oracle, if set.
    pub fn oracle_handle(&self) -> Option<Arc<dyn TimestampOracle>> {
        self.oracle.clone()
    }

    /// Shared floor, if set.
    pub fn floor_handle(&self) -> Option<Arc<SnapshotLowerBound>> {
        self.floor.clone()
    }

    /// Shared metrics registry, if set.
    pub fn metrics_handle(&self) -> Option<Arc<MetricsRegistry>> {
        self.metrics.clone()
    }

    /// Build the oracle probe plugin.
    pub fn build_oracle_probe(&self, config: &ProbeConfig) -> CheckResult<OracleProbe> {
        let oracle = self
            .oracle_handle()
            .ok_or_else(|| CheckError::internal("oracle probe requires an oracle"))?;
        let floor = self
            .floor_handle()
            .ok_or_else(|| CheckError::internal("oracle probe requires a snapshot floor"))?;
        Ok(OracleProbe::new(
            oracle,
            floor,
            config.floor_lag_ms,
            Duration::from_millis(config.round_interval_ms),
        ))
    }
}

impl std::fmt::Debug for PluginBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginBuilder")
            .field("oracle", &self.oracle.as_ref().map(|o| o.kind()))
            .field("floor", &self.floor)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
