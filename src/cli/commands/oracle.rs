//! Oracle command implementation.

use crate::core::shutdown;
use crate::oracle::server::OracleServer;
use crate::oracle::{LocalOracle, RemoteOracle, TimestampOracle};
use crate::ops::telemetry::init_tracing;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;

/// Timestamp oracle operations.
#[derive(Args, Debug)]
pub struct OracleArgs {
    #[command(subcommand)]
    pub command: OracleCommand,
}

/// Oracle subcommands.
#[derive(Subcommand, Debug)]
pub enum OracleCommand {
    /// Serve a local oracle over HTTP.
    Serve {
        /// Bind address.
        #[arg(short, long, default_value = "127.0.0.1:9123")]
        bind: SocketAddr,
    },
    /// Allocate one timestamp from a remote oracle.
    Next {
        /// Oracle base URL.
        #[arg(short, long, default_value = "http://127.0.0.1:9123")]
        endpoint: String,
    },
    /// Print a remote oracle's epoch.
    Start {
        /// Oracle base URL.
        #[arg(short, long, default_value = "http://127.0.0.1:9123")]
        endpoint: String,
    },
}

/// Run the oracle command.
pub async fn run_oracle(args: OracleArgs, log_level: Option<String>) -> Result<()> {
    init_tracing(log_level.as_deref().unwrap_or("info"));

    match args.command {
        OracleCommand::Serve { bind } => serve(bind).await,
        OracleCommand::Next { endpoint } => {
            let oracle = RemoteOracle::new(endpoint)?;
            print_timestamp(oracle.next().await?);
            Ok(())
        }
        OracleCommand::Start { endpoint } => {
            let oracle = RemoteOracle::new(endpoint)?;
            print_timestamp(oracle.start().await?);
            Ok(())
        }
    }
}

async fn serve(bind: SocketAddr) -> Result<()> {
    let oracle = Arc::new(LocalOracle::new());
    tracing::info!(start = %oracle.epoch(), "local oracle created");

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let server = OracleServer::bind(bind, oracle).await?;
    let handle = tokio::spawn(server.serve(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for SIGINT")?;
    tracing::warn!("shutdown signal received (SIGINT)");
    let _ = shutdown_tx.send(true);

    handle.await.context("timestamp service task panicked")?
}

fn print_timestamp(ts: crate::core::time::Timestamp) {
    println!(
        "{} (physical_ms={}, logical={})",
        ts,
        ts.physical_ms(),
        ts.logical()
    );
}
