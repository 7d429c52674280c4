//! Operations: round metrics, reporting and log setup.
//!
//! - [`metrics`] - per-plugin round counters
//! - [`reporter`] - periodic drain of the counters into the log
//! - [`telemetry`] - tracing subscriber installation

pub mod metrics;
pub mod reporter;
pub mod telemetry;
