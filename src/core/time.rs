//! Hybrid timestamps and wall-clock sources.
//!
//! A [`Timestamp`] packs wall-clock milliseconds and a logical counter into
//! a single `u64`:
//!
//! ```text
//! 63                      22 21            6 5        0
//! ┌─────────────────────────┬───────────────┬──────────┐
//! │  physical_ms (42 bits)  │ logical (16)  │ rsvd (6) │
//! └─────────────────────────┴───────────────┴──────────┘
//! ```
//!
//! Oracles allocate in units of one reserved-bit step (`1 << 6`), so the
//! reserved bits of an allocated timestamp are always zero and callers may
//! [`Timestamp::bump`] a value without colliding with the next allocation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Width of the physical (milliseconds) component.
pub const PHYSICAL_BITS: u32 = 42;
/// Width of the logical counter.
pub const LOGICAL_BITS: u32 = 16;
/// Width of the reserved low bits.
pub const RESERVED_BITS: u32 = 6;

/// Shift applied to wall-clock milliseconds.
pub const PHYSICAL_SHIFT: u32 = LOGICAL_BITS + RESERVED_BITS;

/// Smallest increment handed out by an oracle.
pub const ALLOCATION_STEP: u64 = 1 << RESERVED_BITS;

/// Largest representable physical component.
pub const MAX_PHYSICAL_MS: u64 = (1 << PHYSICAL_BITS) - 1;

const LOGICAL_MASK: u64 = ((1 << LOGICAL_BITS) - 1) << RESERVED_BITS;
const RESERVED_MASK: u64 = (1 << RESERVED_BITS) - 1;

/// A hybrid logical timestamp used as a read/write snapshot boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero timestamp.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Wrap a raw encoded value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Encode wall-clock milliseconds with zero logical and reserved bits.
    ///
    /// Milliseconds beyond the 42-bit range are truncated; callers that care
    /// check against [`MAX_PHYSICAL_MS`] first.
    pub const fn from_physical_ms(ms: u64) -> Self {
        Self((ms & MAX_PHYSICAL_MS) << PHYSICAL_SHIFT)
    }

    /// Raw encoded value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Physical component in milliseconds since the Unix epoch.
    pub const fn physical_ms(self) -> u64 {
        self.0 >> PHYSICAL_SHIFT
    }

    /// Logical counter within the physical millisecond.
    pub const fn logical(self) -> u64 {
        (self.0 & LOGICAL_MASK) >> RESERVED_BITS
    }

    /// Reserved low bits.
    pub const fn reserved(self) -> u64 {
        self.0 & RESERVED_MASK
    }

    /// Advance by one allocation step.
    pub const fn bump(self) -> Self {
        Self(self.0.wrapping_add(ALLOCATION_STEP))
    }

    /// This timestamp with its logical and reserved bits cleared.
    pub const fn floor_to_physical(self) -> Self {
        Self::from_physical_ms(self.physical_ms())
    }

    /// A timestamp `ms` milliseconds earlier, saturating at zero.
    pub const fn saturating_sub_ms(self, ms: u64) -> Self {
        Self::from_physical_ms(self.physical_ms().saturating_sub(ms))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Timestamp {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for Timestamp {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Wall clocks
// ============================================================================

/// Source of wall-clock milliseconds for the local oracle.
pub trait WallClock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// The system real-time clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A manually driven clock for tests and simulations.
///
/// Can be moved backwards to model clock skew.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `ms`.
    pub fn new(ms: u64) -> Self {
        Self {
            ms: AtomicU64::new(ms),
        }
    }

    /// Set the current reading.
    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::Release);
    }

    /// Move the reading forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::AcqRel);
    }
}

impl WallClock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::Acquire)
    }
}
