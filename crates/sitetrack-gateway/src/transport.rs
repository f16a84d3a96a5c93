//! Request transport
//!
//! The gateway speaks to a single endpoint. Reads are GET requests carrying
//! an `action` and a `cache_bust` query parameter; writes are POST requests
//! with a JSON body. [`HttpTransport`] sends them with `reqwest`; tests swap
//! in an in-memory implementation of [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::GatewayError;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A request to the backend
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Read: `?action=<action>&cache_bust=<millis>`
    Get { action: String, cache_bust: i64 },
    /// Write: JSON body containing an `action` field
    Post { body: Value },
}

impl Request {
    pub fn get(action: impl Into<String>) -> Self {
        Request::Get {
            action: action.into(),
            cache_bust: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn post(body: Value) -> Self {
        Request::Post { body }
    }

    /// Action name, for logging
    pub fn action(&self) -> &str {
        match self {
            Request::Get { action, .. } => action,
            Request::Post { body } => body.get("action").and_then(Value::as_str).unwrap_or("?"),
        }
    }
}

/// Status line and body of a backend response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    /// A 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw response
    async fn send(&self, request: &Request) -> Result<RawResponse, GatewayError>;
}

/// HTTP transport backed by `reqwest`
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Build a client for `endpoint`. Every request fails after `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = Url::parse(endpoint).map_err(|e| GatewayError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidEndpoint {
                url: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full URL of a GET request
    pub fn read_url(&self, action: &str, cache_bust: i64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", action)
            .append_pair("cache_bust", &cache_bust.to_string());
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse, GatewayError> {
        let response = match request {
            Request::Get { action, cache_bust } => {
                self.client
                    .get(self.read_url(action, *cache_bust))
                    .send()
                    .await?
            }
            Request::Post { body } => {
                self.client
                    .post(self.endpoint.clone())
                    .json(body)
                    .send()
                    .await?
            }
        };

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}
