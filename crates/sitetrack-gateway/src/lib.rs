//! # sitetrack-gateway
//!
//! Client for the spreadsheet backend that stores the project
//! configuration and the progress log.
//!
//! This crate provides:
//! - `Gateway`: fetch/save configuration, fetch/save progress, reset
//! - `Transport`: the request seam, with a `reqwest` implementation
//! - Wire decoding that tolerates the older configuration shapes
//! - `ResetGate`: passphrase confirmation before a reset
//!
//! Every call is a single request. Nothing is retried; a failed batch save
//! leaves the backend untouched.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sitetrack_gateway::Gateway;
//!
//! # async fn run() -> Result<(), sitetrack_gateway::GatewayError> {
//! let gateway = Gateway::connect("https://example.com/exec", Duration::from_secs(30))?;
//! let config = gateway.fetch_config().await?;
//! let records = gateway.fetch_progress().await?;
//! println!("{}: {} records", config.name, records.len());
//! # Ok(())
//! # }
//! ```

pub mod envelope;
pub mod reset;
pub mod transport;
pub mod wire;

pub use reset::{ResetGate, ResetToken};
pub use transport::{HttpTransport, RawResponse, Request, Transport, DEFAULT_TIMEOUT};

use std::time::Duration;

use serde_json::json;
use sitetrack_core::{ProgressEntry, ProgressRecord, ProjectConfig};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend answered with a non-2xx status
    #[error("Network error: {status} {reason}")]
    Network { status: u16, reason: String },

    /// The request never got a response (connection, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend reported a failure; message is passed through verbatim
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("The backend response could not be processed")]
    MalformedResponse,

    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Reset passphrase does not match")]
    ResetDenied,

    #[error("Reset is disabled: no passphrase configured")]
    ResetDisabled,
}

// ============================================================================
// Gateway
// ============================================================================

/// Outcome of a batch save
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Rows accepted by the backend
    pub saved: usize,
}

/// Backend client
#[derive(Debug)]
pub struct Gateway<T = HttpTransport> {
    transport: T,
}

impl Gateway<HttpTransport> {
    /// Gateway over HTTP with a request timeout
    pub fn connect(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
        Ok(Self::new(HttpTransport::new(endpoint, timeout)?))
    }
}

impl<T: Transport> Gateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call(&self, request: Request) -> Result<serde_json::Value, GatewayError> {
        tracing::debug!(action = request.action(), "gateway request");
        let response = self.transport.send(&request).await?;
        tracing::debug!(action = request.action(), status = response.status, "gateway response");
        envelope::open(response)
    }

    /// Project configuration; an empty payload yields an unconfigured project
    pub async fn fetch_config(&self) -> Result<ProjectConfig, GatewayError> {
        let data = self.call(Request::get("getConfig")).await?;
        let config = wire::decode_config(data)?;
        tracing::info!(
            project = %config.name,
            towers = config.towers.len(),
            activities = config.activities.len(),
            "fetched configuration"
        );
        Ok(config)
    }

    /// Every progress record; unreadable rows are dropped
    pub async fn fetch_progress(&self) -> Result<Vec<ProgressRecord>, GatewayError> {
        let data = self.call(Request::get("fetchProgress")).await?;
        let records = wire::decode_records(data);
        tracing::info!(records = records.len(), "fetched progress");
        Ok(records)
    }

    /// Replace the project configuration
    pub async fn save_config(&self, config: &ProjectConfig) -> Result<(), GatewayError> {
        self.call(Request::post(wire::encode_config(config))).await?;
        tracing::info!(project = %config.name, "saved configuration");
        Ok(())
    }

    /// Append a batch of progress entries in one request.
    ///
    /// The batch is all-or-nothing: on error no entry was stored. An empty
    /// batch sends nothing.
    pub async fn save_progress(&self, entries: &[ProgressEntry]) -> Result<BatchReceipt, GatewayError> {
        if entries.is_empty() {
            return Ok(BatchReceipt { saved: 0 });
        }

        let data = self.call(Request::post(wire::encode_entries(entries))).await?;
        let saved = wire::decode_saved_count(&data).unwrap_or(entries.len());
        if saved != entries.len() {
            tracing::warn!(sent = entries.len(), saved, "backend saved a different row count");
        }
        tracing::info!(saved, "saved progress batch");
        Ok(BatchReceipt { saved })
    }

    /// Delete all configuration and progress. Requires a confirmed token.
    pub async fn reset_project(&self, _token: ResetToken) -> Result<(), GatewayError> {
        self.call(Request::post(json!({ "action": "resetProject" }))).await?;
        tracing::warn!("project data reset");
        Ok(())
    }
}
