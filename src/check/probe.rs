//! Oracle probe plugin.
//!
//! Checks the substrate the other plugins stand on. Each round:
//! 1. draws a timestamp from the oracle
//! 2. requires it to be above the oracle epoch and the previous draw
//! 3. requires it to be fresh against the snapshot floor
//! 4. proposes a new floor `floor_lag_ms` behind the draw
//!
//! A failed step 2 is an inconsistency in the oracle itself.

use crate::check::floor::SnapshotLowerBound;
use crate::check::plugin::{Plugin, RoundContext, RoundFuture};
use crate::core::error::{CheckError, CheckResult};
use crate::core::time::Timestamp;
use crate::oracle::TimestampOracle;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Name the probe registers under.
pub const ORACLE_PROBE_NAME: &str = "tso-probe";

/// Built-in plugin verifying oracle monotonicity and floor freshness.
pub struct OracleProbe {
    oracle: Arc<dyn TimestampOracle>,
    floor: Arc<SnapshotLowerBound>,
    floor_lag_ms: u64,
    round_interval: Duration,
    /// Epoch and last draw, filled on the first round.
    state: Mutex<ProbeState>,
}

#[derive(Debug, Default, Clone, Copy)]
struct ProbeState {
    epoch: Option<Timestamp>,
    last: Timestamp,
}

impl OracleProbe {
    pub fn new(
        oracle: Arc<dyn TimestampOracle>,
        floor: Arc<SnapshotLowerBound>,
        floor_lag_ms: u64,
        round_interval: Duration,
    ) -> Self {
        Self {
            oracle,
            floor,
            floor_lag_ms,
            round_interval,
            state: Mutex::new(ProbeState::default()),
        }
    }

    /// Last timestamp this probe drew.
    pub fn last_drawn(&self) -> Timestamp {
        self.state.lock().last
    }

    async fn probe_once(&self, ctx: &RoundContext) -> CheckResult<()> {
        let known_epoch = self.state.lock().epoch;
        let epoch = match known_epoch {
            Some(epoch) => epoch,
            None => {
                let epoch = self.oracle.start().await?;
                self.state.lock().epoch = Some(epoch);
                epoch
            }
        };

        let ts = self.oracle.next().await?;

        {
            let mut state = self.state.lock();
            let previous = state.last.max(epoch);
            if ts <= previous {
                tracing::error!(
                    previous = %previous,
                    observed = %ts,
                    "oracle returned a non-increasing timestamp"
                );
                return Err(CheckError::NonMonotonic {
                    previous,
                    observed: ts,
                });
            }
            state.last = ts;
        }

        self.floor.ensure_fresh(ts)?;
        self.floor
            .propose_advance(ts.saturating_sub_ms(self.floor_lag_ms));

        tracing::trace!(ts = %ts, floor = %self.floor.read(), "probe round");

        if !self.round_interval.is_zero() {
            ctx.pause(self.round_interval).await?;
        }
        Ok(())
    }
}

impl Plugin for OracleProbe {
    fn name(&self) -> &str {
        ORACLE_PROBE_NAME
    }

    fn round<'a>(&'a self, ctx: &'a RoundContext, _correlation_id: &'a str) -> RoundFuture<'a> {
        Box::pin(self.probe_once(ctx))
    }
}
