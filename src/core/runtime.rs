//! Harness orchestration.
//!
//! The harness owns the process-lifetime shared state and wires it into the
//! components that need it:
//! - Start order: oracle → floor + metrics → plugins → oracle server → reporter → scheduler
//! - Stop order: scheduler → oracle server → reporter (final report)

use crate::check::floor::SnapshotLowerBound;
use crate::check::plugin::{Plugin, PluginBuilder};
use crate::check::scheduler::PluginScheduler;
use crate::core::config::Config;
use crate::core::error::CheckError;
use crate::core::shutdown::{self, ShutdownReceiver, ShutdownSender};
use crate::oracle::server::OracleServer;
use crate::oracle::{LocalOracle, RemoteOracle, TimestampOracle};
use crate::ops::metrics::MetricsRegistry;
use crate::ops::reporter::RoundReporter;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Consistency-check harness holding all shared handles.
pub struct Harness {
    /// Configuration.
    config: Arc<Config>,

    /// Timestamp oracle shared by every plugin.
    oracle: Arc<dyn TimestampOracle>,

    /// Snapshot lower bound shared by every plugin.
    floor: Arc<SnapshotLowerBound>,

    /// Round counters.
    metrics: Arc<MetricsRegistry>,

    /// Plugin scheduler.
    scheduler: PluginScheduler,

    /// Shutdown signal sender.
    shutdown_tx: Arc<ShutdownSender>,

    /// Shutdown signal receiver.
    shutdown_rx: ShutdownReceiver,
}

impl Harness {
    /// Create a harness with the given configuration.
    ///
    /// Registers the oracle probe when it is enabled.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let oracle = build_oracle(&config)?;
        let floor = Arc::new(SnapshotLowerBound::new());
        let metrics = Arc::new(MetricsRegistry::new());
        let (shutdown_tx, shutdown_rx) = shutdown::channel();

        let mut harness = Self {
            config: Arc::new(config),
            oracle,
            floor,
            metrics: metrics.clone(),
            scheduler: PluginScheduler::new(metrics),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        };

        if harness.config.probe.enabled {
            let probe = harness
                .plugin_builder()
                .build_oracle_probe(&harness.config.probe)?;
            harness.register(Arc::new(probe));
        }

        Ok(harness)
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared oracle.
    pub fn oracle(&self) -> Arc<dyn TimestampOracle> {
        self.oracle.clone()
    }

    /// Shared snapshot floor.
    pub fn floor(&self) -> Arc<SnapshotLowerBound> {
        self.floor.clone()
    }

    /// Shared round counters.
    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        self.metrics.clone()
    }

    /// Builder pre-filled with the shared handles.
    pub fn plugin_builder(&self) -> PluginBuilder {
        PluginBuilder::new()
            .oracle(self.oracle.clone())
            .floor(self.floor.clone())
            .metrics(self.metrics.clone())
    }

    /// Register an externally built plugin. Must precede [`run`](Self::run).
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.scheduler.register(plugin);
    }

    /// Registered plugin names.
    pub fn plugin_names(&self) -> Vec<String> {
        self.scheduler.plugin_names()
    }

    /// Request a graceful stop.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Handle that can request a stop from another task.
    pub fn shutdown_handle(&self) -> Arc<ShutdownSender> {
        self.shutdown_tx.clone()
    }

    /// Run until a plugin fails or shutdown is requested.
    ///
    /// A stop by request is `Ok(())`. A plugin failure is returned as a
    /// [`CheckError`] inside the `anyhow::Error`.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            oracle = self.oracle.kind(),
            plugins = ?self.plugin_names(),
            "starting harness"
        );

        let server = match self.serve_addr()? {
            Some(addr) => {
                let server = OracleServer::bind(addr, self.oracle.clone()).await?;
                Some(tokio::spawn(server.serve(self.shutdown_rx.clone())))
            }
            None => None,
        };

        let reporter = RoundReporter::new(
            self.metrics.clone(),
            self.floor.clone(),
            self.config.scheduler.report_interval(),
        );
        let reporter = tokio::spawn(reporter.run(self.shutdown_rx.clone()));

        let outcome = self.scheduler.run(self.shutdown_rx.clone()).await;

        // Scheduler is done; stop everything else.
        let _ = self.shutdown_tx.send(true);

        if let Some(handle) = server {
            match tokio::time::timeout(self.config.scheduler.shutdown_grace(), handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(error = %e, "timestamp service stopped with error"),
                Ok(Err(e)) => tracing::warn!(error = %e, "timestamp service task panicked"),
                Err(_) => tracing::warn!("timestamp service stop timed out"),
            }
        }

        if let Err(e) = reporter.await {
            tracing::warn!(error = %e, "reporter task panicked");
        }

        match outcome {
            Ok(()) | Err(CheckError::Cancelled) => {
                tracing::info!(floor = %self.floor.read(), "harness stopped");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "harness stopped on failure");
                Err(err.into())
            }
        }
    }

    /// Run until SIGINT, a shutdown request, or a plugin failure.
    pub async fn run_until_signal(&self) -> Result<()> {
        let shutdown_tx = self.shutdown_tx.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("shutdown signal received (SIGINT)");
                let _ = shutdown_tx.send(true);
            }
        });

        let result = self.run().await;
        signal.abort();
        result
    }

    fn serve_addr(&self) -> Result<Option<SocketAddr>> {
        match self.config.oracle.serve_bind {
            Some(ref bind) => {
                let addr = bind
                    .parse()
                    .with_context(|| format!("invalid oracle.serve_bind: {}", bind))?;
                Ok(Some(addr))
            }
            None => Ok(None),
        }
    }
}

/// Build the oracle the configuration asks for.
pub fn build_oracle(config: &Config) -> Result<Arc<dyn TimestampOracle>> {
    if config.oracle.is_remote() {
        let endpoint = config
            .oracle
            .endpoint
            .as_deref()
            .context("oracle.endpoint required for remote mode")?;
        let oracle = RemoteOracle::with_timeout(endpoint, config.oracle.request_timeout())
            .context("failed to create remote oracle client")?;
        tracing::info!(endpoint = %oracle.base_url(), "using remote timestamp oracle");
        Ok(Arc::new(oracle))
    } else {
        let oracle = LocalOracle::new();
        tracing::info!(start = %oracle.epoch(), "using local timestamp oracle");
        Ok(Arc::new(oracle))
    }
}
