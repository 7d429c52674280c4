//! Snapshot lower bound.
//!
//! The oldest timestamp still guaranteed safe to read at. Any task may
//! propose a higher floor; the register only ever moves up, and its final
//! value is the maximum ever proposed.

use crate::core::error::StaleSnapshotError;
use crate::core::time::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic floor for read timestamps.
#[derive(Debug, Default)]
pub struct SnapshotLowerBound {
    floor: AtomicU64,
}

impl SnapshotLowerBound {
    /// Create a floor at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a floor starting at `initial`.
    pub fn starting_at(initial: Timestamp) -> Self {
        Self {
            floor: AtomicU64::new(initial.as_u64()),
        }
    }

    /// Current floor.
    pub fn read(&self) -> Timestamp {
        Timestamp::from_raw(self.floor.load(Ordering::Acquire))
    }

    /// Raise the floor to `candidate` if it is strictly higher.
    ///
    /// Returns true if this call moved the floor.
    pub fn propose_advance(&self, candidate: Timestamp) -> bool {
        let updated = candidate.as_u64();
        let mut old = self.floor.load(Ordering::Acquire);
        loop {
            if old >= updated {
                return false;
            }
            match self.floor.compare_exchange_weak(
                old,
                updated,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::info!(
                        from = old,
                        to = updated,
                        "snapshot lower bound advanced"
                    );
                    return true;
                }
                Err(observed) => old = observed,
            }
        }
    }

    /// Reject a read timestamp at or below the current floor.
    pub fn ensure_fresh(&self, ts: Timestamp) -> Result<(), StaleSnapshotError> {
        if ts <= self.read() {
            return Err(StaleSnapshotError { ts });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_non_increasing_proposals_are_noops() {
        let floor = SnapshotLowerBound::starting_at(Timestamp::from_raw(100));
        assert!(!floor.propose_advance(Timestamp::from_raw(100)));
        assert!(!floor.propose_advance(Timestamp::from_raw(50)));
        assert!(!floor.propose_advance(Timestamp::ZERO));
        assert_eq!(floor.read().as_u64(), 100);
    }

    #[test]
    fn test_increasing_proposals_take_effect() {
        let floor = SnapshotLowerBound::new();
        assert!(floor.propose_advance(Timestamp::from_raw(10)));
        assert!(floor.propose_advance(Timestamp::from_raw(20)));
        assert_eq!(floor.read().as_u64(), 20);
    }

    #[test]
    fn test_concurrent_proposals_leave_maximum() {
        let floor = Arc::new(SnapshotLowerBound::new());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let floor = floor.clone();
                std::thread::spawn(move || {
                    for i in 0..2_000u64 {
                        floor.propose_advance(Timestamp::from_raw(i * 8 + t));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(floor.read().as_u64(), 1_999 * 8 + 7);
    }

    #[test]
    fn test_ensure_fresh() {
        let floor = SnapshotLowerBound::starting_at(Timestamp::from_raw(500));
        assert!(floor.ensure_fresh(Timestamp::from_raw(501)).is_ok());
        let err = floor.ensure_fresh(Timestamp::from_raw(500)).unwrap_err();
        assert_eq!(err.ts.as_u64(), 500);
        assert!(floor.ensure_fresh(Timestamp::from_raw(10)).is_err());
    }
}
