//! CLI command implementations.

mod config;
mod oracle;
mod run;

pub use config::{run_config, ConfigArgs, ConfigCommand};
pub use oracle::{run_oracle, OracleArgs, OracleCommand};
pub use run::{load_config, run_harness, RunArgs};
