//! Fail-fast plugin scheduler.
//!
//! Every registered plugin gets one task that loops on [`Plugin::round`]
//! until the round fails or the run is cancelled. All tasks share a group
//! cancellation signal derived from the caller's shutdown signal:
//!
//! ```text
//!   caller shutdown ──► forwarder ──► group cancel ──► loop 1 .. loop N
//!                                          ▲
//!   first non-cancel error ────────────────┘
//! ```
//!
//! [`PluginScheduler::run`] joins every loop before returning, so when it
//! returns no round is in flight.

use crate::check::plugin::{Plugin, RoundContext};
use crate::core::error::{CheckError, CheckResult};
use crate::core::shutdown::{self, ShutdownReceiver, ShutdownSender};
use crate::ops::metrics::MetricsRegistry;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Drives registered plugins concurrently with a single outcome.
pub struct PluginScheduler {
    metrics: Arc<MetricsRegistry>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginScheduler {
    /// Create a scheduler recording rounds into `metrics`.
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            metrics,
            plugins: Vec::new(),
        }
    }

    /// Add a plugin and register its metrics key.
    ///
    /// Must be called before [`run`](Self::run).
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.metrics.register(plugin.name());
        tracing::debug!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    /// Registered plugin names in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Shared metrics registry.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Run every plugin until `shutdown` fires or one of them fails.
    ///
    /// Returns the first non-cancellation error observed, after cancelling
    /// and joining every other loop. If all loops stop because of
    /// cancellation the result is [`CheckError::Cancelled`]. With no
    /// plugins registered this returns `Ok(())` immediately.
    pub async fn run(&self, shutdown: ShutdownReceiver) -> CheckResult<()> {
        if self.plugins.is_empty() {
            tracing::warn!("no plugins registered, nothing to run");
            return Ok(());
        }

        tracing::info!(plugins = self.plugins.len(), "scheduler start");

        let (group_tx, group_rx) = shutdown::channel();
        let group_tx = Arc::new(group_tx);
        let forwarder = tokio::spawn(forward_shutdown(shutdown, group_tx.clone()));

        let mut loops = JoinSet::new();
        for plugin in &self.plugins {
            let correlation_id = uuid::Uuid::new_v4().to_string();
            let span = tracing::info_span!(
                "plugin",
                plugin = plugin.name(),
                trace_id = %correlation_id
            );
            let ctx = RoundContext::new(plugin.name(), correlation_id, group_rx.clone());
            loops.spawn(
                plugin_loop(plugin.clone(), ctx, self.metrics.clone()).instrument(span),
            );
        }
        drop(group_rx);

        let mut first_error: Option<CheckError> = None;
        let mut cancelled = 0usize;
        while let Some(joined) = loops.join_next().await {
            let err = match joined {
                Ok(Err(err)) => err,
                Ok(Ok(())) => CheckError::internal("plugin loop exited without an outcome"),
                Err(join_err) => CheckError::internal(format!("plugin task failed: {join_err}")),
            };

            if err.is_cancelled() {
                cancelled += 1;
                continue;
            }

            if first_error.is_none() {
                tracing::error!(error = %err, "plugin failed, cancelling remaining plugins");
                let _ = group_tx.send(true);
                first_error = Some(err);
            } else {
                tracing::warn!(error = %err, "additional plugin failure during cancellation");
            }
        }

        forwarder.abort();

        match first_error {
            Some(err) => Err(err),
            None => {
                tracing::info!(cancelled, "scheduler stopped by cancellation");
                Err(CheckError::Cancelled)
            }
        }
    }
}

/// Propagate the caller's shutdown into the group signal.
async fn forward_shutdown(mut shutdown: ShutdownReceiver, group: Arc<ShutdownSender>) {
    shutdown::requested(&mut shutdown).await;
    let _ = group.send(true);
}

/// One plugin's loop. Only ever returns an error.
async fn plugin_loop(
    plugin: Arc<dyn Plugin>,
    ctx: RoundContext,
    metrics: Arc<MetricsRegistry>,
) -> CheckResult<()> {
    tracing::info!("plugin loop start");
    loop {
        if ctx.is_cancelled() {
            tracing::info!("plugin loop cancelled");
            return Err(CheckError::Cancelled);
        }

        if let Err(err) = plugin.round(&ctx, ctx.correlation_id()).await {
            if err.is_cancelled() && ctx.is_cancelled() {
                return Err(err);
            }
            // A round may only report cancellation once the group is cancelled.
            let err = if err.is_cancelled() {
                CheckError::internal(format!(
                    "plugin {} reported cancellation without a stop request",
                    plugin.name()
                ))
            } else {
                err
            };
            tracing::warn!(error = %err, "plugin round failed");
            return Err(err);
        }
        metrics.increment(plugin.name())?;

        // Rounds that complete without awaiting would otherwise starve the
        // cancellation forwarder on a single-threaded runtime.
        tokio::task::yield_now().await;
    }
}
