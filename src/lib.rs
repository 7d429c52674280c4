//! crosscheck - timestamp, scheduling and failure-propagation substrate for
//! continuous consistency testing of a sharded database.
//!
//! Check routines ("plugins") run concurrently and forever, each reading at
//! timestamps handed out by a shared oracle and validated against a shared
//! snapshot floor. The first plugin to fail stops the whole run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         PluginScheduler                         │
//! │        one task per plugin │ group cancel │ first error wins    │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                       │                     │
//! ┌────────────────────┐  ┌────────────────────┐  ┌─────────────────┐
//! │  TimestampOracle   │  │ SnapshotLowerBound │  │ MetricsRegistry │
//! │  local │ remote    │  │   CAS max register │  │ rounds / plugin │
//! └────────────────────┘  └────────────────────┘  └─────────────────┘
//!            │
//! ┌────────────────────┐
//! │  HTTP /current     │
//! │       /start       │
//! └────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error taxonomy and violation records
//! - [`core::runtime`] - Harness orchestration
//! - [`core::shutdown`] - Shared shutdown signal
//! - [`core::time`] - Hybrid timestamp encoding
//!
//! ## Oracle
//! - [`oracle::local`] - Lock-free in-process oracle
//! - [`oracle::remote`] - HTTP client for a remote authority
//! - [`oracle::server`] - HTTP timestamp service
//!
//! ## Checks
//! - [`check::floor`] - Snapshot lower bound
//! - [`check::plugin`] - Plugin contract
//! - [`check::probe`] - Built-in oracle probe
//! - [`check::scheduler`] - Fail-fast scheduler
//!
//! ## Operations
//! - [`ops::metrics`] - Round counters
//! - [`ops::reporter`] - Periodic round reports
//! - [`ops::telemetry`] - Tracing setup
//!
//! # Key Invariants
//!
//! - Timestamps from one oracle are strictly increasing across all callers
//! - The snapshot floor never decreases
//! - Round counts are exact under concurrent increments
//! - `run` returns only after every plugin loop has exited

// Core infrastructure
pub mod core;

// Timestamp oracles
pub mod oracle;

// Check substrate
pub mod check;

// Operations and observability
pub mod ops;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::error::{
    AccountBalance, CheckError, CheckResult, ConsistencyViolation, OracleError, OracleResult,
    StaleSnapshotError,
};
pub use self::core::runtime::Harness;
pub use self::core::time::Timestamp;
pub use check::floor::SnapshotLowerBound;
pub use check::plugin::{Plugin, PluginBuilder, RoundContext, RoundFuture};
pub use check::probe::OracleProbe;
pub use check::scheduler::PluginScheduler;
pub use ops::metrics::MetricsRegistry;
pub use oracle::{LocalOracle, RemoteOracle, TimestampOracle};
