//! HTTP timestamp service.
//!
//! Serves `GET /current` and `GET /start` from any [`TimestampOracle`] using
//! the encoding [`super::remote::RemoteOracle`] expects. Oracle failures are
//! reported as `503 Service Unavailable` with the error text as the body.

use super::remote::encode_timestamp;
use super::TimestampOracle;
use crate::core::shutdown::{self, ShutdownReceiver};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

type SharedOracle = Arc<dyn TimestampOracle>;

/// Build the router for the timestamp service.
pub fn router(oracle: SharedOracle) -> Router {
    Router::new()
        .route("/current", get(current))
        .route("/start", get(start))
        .with_state(oracle)
}

async fn current(State(oracle): State<SharedOracle>) -> Response {
    match oracle.next().await {
        Ok(ts) => (StatusCode::OK, encode_timestamp(ts)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "timestamp allocation failed");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}

async fn start(State(oracle): State<SharedOracle>) -> Response {
    match oracle.start().await {
        Ok(ts) => (StatusCode::OK, encode_timestamp(ts)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "timestamp epoch unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}

/// A bound, not yet serving, timestamp service.
pub struct OracleServer {
    listener: TcpListener,
    oracle: SharedOracle,
}

impl OracleServer {
    /// Bind the service to `addr`. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr, oracle: SharedOracle) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind oracle server on {}", addr))?;
        Ok(Self { listener, oracle })
    }

    /// Address the service is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("oracle server has no local address")
    }

    /// Serve until shutdown is requested.
    pub async fn serve(self, mut stop: ShutdownReceiver) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(
            addr = %addr,
            oracle = self.oracle.kind(),
            "timestamp service listening"
        );

        axum::serve(self.listener, router(self.oracle))
            .with_graceful_shutdown(async move { shutdown::requested(&mut stop).await })
            .await
            .context("timestamp service error")?;

        tracing::info!(addr = %addr, "timestamp service stopped");
        Ok(())
    }
}
