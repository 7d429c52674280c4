//! Core infrastructure.
//!
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error taxonomy, including the violation records checks report
//! - [`runtime`] - Harness orchestration
//! - [`shutdown`] - Shared shutdown signal
//! - [`time`] - Hybrid timestamp encoding and wall clocks

pub mod config;
pub mod error;
pub mod runtime;
pub mod shutdown;
pub mod time;
