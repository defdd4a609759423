//! HTTP plumbing shared by every source.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Transport-level failures. Never surfaced through the source contract.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::ConnectionFailed(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Body(e.to_string())
        }
    }
}

/// Thin wrapper around a `reqwest::Client` that optionally routes requests
/// through a fetch gateway (`{gateway}/proxy?url=<target>`).
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    gateway_url: Option<String>,
}

impl SourceClient {
    /// Client that talks to providers directly.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            gateway_url: None,
        }
    }

    /// Route every request through the gateway at `gateway_url`.
    pub fn via_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn uses_gateway(&self) -> bool {
        self.gateway_url.is_some()
    }

    /// The URL actually requested for `target`.
    pub fn resolve(&self, target: &str) -> String {
        match &self.gateway_url {
            Some(gateway) => format!(
                "{}/proxy?url={}",
                gateway.trim_end_matches('/'),
                urlencoding::encode(target)
            ),
            None => target.to_string(),
        }
    }

    async fn get(&self, target: &str) -> Result<reqwest::Response, FetchError> {
        let url = self.resolve(target);
        debug!(url = %url, "Fetching");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }

    /// GET `target` and return the body as text.
    pub async fn get_text(&self, target: &str) -> Result<String, FetchError> {
        let response = self.get(target).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }

    /// GET `target` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T, FetchError> {
        let body = self.get_text(target).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Liveness probe: `true` only for a successful response.
    pub async fn probe(&self, target: &str) -> bool {
        match self.get(target).await {
            Ok(_) => true,
            Err(e) => {
                debug!(url = %target, error = %e, "Probe failed");
                false
            }
        }
    }
}
