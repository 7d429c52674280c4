//! In-process timestamp oracle.
//!
//! Allocation never blocks. Each call first pulls the shared clock up to the
//! current wall-clock millisecond (absorbing forward jumps), then atomically
//! adds one allocation step. When many calls land in the same millisecond the
//! logical counter advances; once its 16 bits are used up the addition
//! carries into the physical component, so the oracle runs slightly ahead of
//! real time until the wall clock catches up. Carries are counted, never
//! wrapped. A backwards clock jump is absorbed the same way: the shared clock
//! simply keeps counting from where it was. The shared clock starts at the
//! epoch, so no allocation can fall below [`LocalOracle::epoch`] even when the
//! wall clock steps back right after construction.

use super::{OracleFuture, TimestampOracle};
use crate::core::error::{OracleError, OracleResult};
use crate::core::time::{SystemClock, Timestamp, WallClock, ALLOCATION_STEP, MAX_PHYSICAL_MS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free hybrid-clock oracle.
pub struct LocalOracle {
    /// Last allocated timestamp (or the catch-up threshold).
    clock: AtomicU64,
    /// Epoch captured at construction.
    start: Timestamp,
    /// Allocations whose physical part ran ahead of the wall clock.
    carries: AtomicU64,
    wall: Arc<dyn WallClock>,
}

impl LocalOracle {
    /// Create an oracle on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an oracle reading an explicit wall clock.
    pub fn with_clock(wall: Arc<dyn WallClock>) -> Self {
        let start = Timestamp::from_physical_ms(wall.now_ms());
        Self {
            clock: AtomicU64::new(start.as_u64()),
            start,
            carries: AtomicU64::new(0),
            wall,
        }
    }

    /// The epoch captured at construction.
    pub fn epoch(&self) -> Timestamp {
        self.start
    }

    /// Allocate the next timestamp.
    pub fn allocate(&self) -> OracleResult<Timestamp> {
        let now_ms = self.wall.now_ms();
        if now_ms > MAX_PHYSICAL_MS {
            return Err(OracleError::Exhausted {
                physical_ms: now_ms,
            });
        }
        let threshold = Timestamp::from_physical_ms(now_ms).as_u64();

        // Catch up with the wall clock.
        let mut last = self.clock.load(Ordering::Acquire);
        while last < threshold {
            match self.clock.compare_exchange_weak(
                last,
                threshold,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => last = observed,
            }
        }

        let allocated = self
            .clock
            .fetch_add(ALLOCATION_STEP, Ordering::AcqRel)
            .wrapping_add(ALLOCATION_STEP);
        let ts = Timestamp::from_raw(allocated);

        // Carrying out of the top physical bit wraps the raw value.
        if allocated < threshold {
            return Err(OracleError::Exhausted {
                physical_ms: MAX_PHYSICAL_MS + 1,
            });
        }

        if ts.physical_ms() > now_ms {
            self.carries.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                ts = %ts,
                wall_ms = now_ms,
                "allocation ran ahead of the wall clock"
            );
        }

        Ok(ts)
    }

    /// Number of allocations whose physical part was ahead of the wall clock.
    ///
    /// One logical-counter carry can make many later allocations count here
    /// until the wall clock catches up.
    ///
    /// This includes allocations made while the wall clock was behind an
    /// earlier reading (backwards skew).
    pub fn carries(&self) -> u64 {
        self.carries.load(Ordering::Relaxed)
    }
}

impl Default for LocalOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampOracle for LocalOracle {
    fn start(&self) -> OracleFuture<'_> {
        let start = self.start;
        Box::pin(async move { Ok(start) })
    }

    fn next(&self) -> OracleFuture<'_> {
        let result = self.allocate();
        Box::pin(async move { result })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
