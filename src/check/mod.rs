//! Check execution substrate.
//!
//! - [`floor`] - shared snapshot lower bound
//! - [`plugin`] - the plugin contract and round context
//! - [`probe`] - built-in oracle probe plugin
//! - [`scheduler`] - fail-fast concurrent plugin driver

pub mod floor;
pub mod plugin;
pub mod probe;
pub mod scheduler;
