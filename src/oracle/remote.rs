//! HTTP client for a remote timestamp authority.
//!
//! Wire protocol (plain text):
//! - `GET /current` - allocate a timestamp; body is a decimal integer and a newline
//! - `GET /start` - the authority's fixed epoch, same encoding
//!
//! Every call is a network round-trip; nothing is cached. Transport, status
//! and decoding failures come back as [`OracleError`] values.

use super::{OracleFuture, TimestampOracle};
use crate::core::error::{OracleError, OracleResult};
use crate::core::time::Timestamp;
use reqwest::Client;
use std::time::Duration;

const CURRENT_PATH: &str = "/current";
const START_PATH: &str = "/start";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Oracle that delegates to a remote HTTP authority.
#[derive(Debug, Clone)]
pub struct RemoteOracle {
    client: Client,
    base_url: String,
}

impl RemoteOracle {
    /// Create a client targeting `base_url` (e.g. `http://tso.local:9123`).
    pub fn new(base_url: impl Into<String>) -> OracleResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> OracleResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(OracleError::Transport {
                url: base_url,
                message: "oracle endpoint must not be empty".to_string(),
            });
        }
        // The client is built without TLS support.
        if !base_url.starts_with("http://") {
            return Err(OracleError::Transport {
                url: base_url,
                message: "oracle endpoint must be a plain http:// URL".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| OracleError::Transport {
                url: base_url.clone(),
                message: format!("http client build failed: {err}"),
            })?;
        Ok(Self { client, base_url })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, path: &str) -> OracleResult<Timestamp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| OracleError::Transport {
                url: url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|err| OracleError::Transport {
            url: url.clone(),
            message: format!("failed to read body: {err}"),
        })?;

        decode_timestamp(&body).map_err(|reason| OracleError::Decode {
            url,
            body,
            reason,
        })
    }
}

/// Decode a newline-terminated decimal timestamp.
pub fn decode_timestamp(body: &str) -> Result<Timestamp, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err("empty body".to_string());
    }
    trimmed.parse::<Timestamp>().map_err(|err| err.to_string())
}

/// Encode a timestamp as a response body.
pub fn encode_timestamp(ts: Timestamp) -> String {
    format!("{}\n", ts)
}

impl TimestampOracle for RemoteOracle {
    fn start(&self) -> OracleFuture<'_> {
        Box::pin(self.fetch(START_PATH))
    }

    fn next(&self) -> OracleFuture<'_> {
        Box::pin(self.fetch(CURRENT_PATH))
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}
