//! Timestamp oracles.
//!
//! An oracle hands out strictly increasing [`Timestamp`]s usable as snapshot
//! boundaries. Two implementations share the [`TimestampOracle`] trait:
//! - [`local::LocalOracle`] - lock-free, in-process
//! - [`remote::RemoteOracle`] - delegates to an HTTP authority
//!
//! [`server`] exposes any oracle over the same HTTP protocol the remote
//! client speaks, so one process can be the authority for a fleet.

pub mod local;
pub mod remote;
pub mod server;

use crate::core::error::OracleResult;
use crate::core::time::Timestamp;
use std::future::Future;
use std::pin::Pin;

pub use local::LocalOracle;
pub use remote::RemoteOracle;

/// Boxed future returned by oracle operations.
pub type OracleFuture<'a> = Pin<Box<dyn Future<Output = OracleResult<Timestamp>> + Send + 'a>>;

/// A source of globally ordered timestamps.
pub trait TimestampOracle: Send + Sync {
    /// The fixed epoch captured when the oracle was created.
    ///
    /// Wall-clock milliseconds at construction with zero logical bits.
    fn start(&self) -> OracleFuture<'_>;

    /// Allocate a timestamp strictly greater than every timestamp this
    /// oracle has returned before, including to concurrent callers.
    fn next(&self) -> OracleFuture<'_>;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}
