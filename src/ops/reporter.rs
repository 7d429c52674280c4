//! Periodic round reporting.
//!
//! Drains the metrics registry on a fixed interval and logs how many rounds
//! each plugin completed since the previous report, together with the
//! current snapshot floor.

use crate::check::floor::SnapshotLowerBound;
use crate::core::shutdown::{self, ShutdownReceiver};
use crate::ops::metrics::MetricsRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// One drained interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Rounds completed per plugin during the interval.
    pub rounds: BTreeMap<String, u64>,
    /// Snapshot floor at the time of the report.
    pub floor: u64,
}

impl RoundReport {
    /// Total rounds across all plugins.
    pub fn total(&self) -> u64 {
        self.rounds.values().sum()
    }
}

/// Periodically drains round counters into the log.
pub struct RoundReporter {
    metrics: Arc<MetricsRegistry>,
    floor: Arc<SnapshotLowerBound>,
    interval: Duration,
}

impl RoundReporter {
    pub fn new(
        metrics: Arc<MetricsRegistry>,
        floor: Arc<SnapshotLowerBound>,
        interval: Duration,
    ) -> Self {
        Self {
            metrics,
            floor,
            interval,
        }
    }

    /// Drain the counters once and log the result.
    pub fn report(&self) -> RoundReport {
        let report = RoundReport {
            rounds: self.metrics.snapshot_and_reset(),
            floor: self.floor.read().as_u64(),
        };
        for (plugin, rounds) in &report.rounds {
            tracing::info!(plugin = %plugin, rounds, "rounds completed");
        }
        tracing::info!(
            total = report.total(),
            snapshot_lower_bound = report.floor,
            interval_ms = self.interval.as_millis() as u64,
            "round report"
        );
        report
    }

    /// Report every interval until shutdown, then once more.
    pub async fn run(self, mut stop: ShutdownReceiver) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report();
                }
                _ = shutdown::requested(&mut stop) => {
                    break;
                }
            }
        }

        self.report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::Timestamp;

    #[test]
    fn test_report_drains_counters() {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.register("a");
        metrics.register("b");
        metrics.increment("a").unwrap();
        metrics.increment("a").unwrap();
        metrics.increment("b").unwrap();
        let floor = Arc::new(SnapshotLowerBound::starting_at(Timestamp::from_raw(77)));

        let reporter = RoundReporter::new(metrics.clone(), floor, Duration::from_secs(1));
        let report = reporter.report();
        assert_eq!(report.rounds.get("a"), Some(&2));
        assert_eq!(report.rounds.get("b"), Some(&1));
        assert_eq!(report.total(), 3);
        assert_eq!(report.floor, 77);

        assert_eq!(reporter.report().total(), 0);
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let metrics = Arc::new(MetricsRegistry::new());
        let floor = Arc::new(SnapshotLowerBound::new());
        let reporter = RoundReporter::new(metrics, floor, Duration::from_secs(3600));
        let (tx, rx) = shutdown::channel();
        let handle = tokio::spawn(reporter.run(rx));
        let _ = tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
