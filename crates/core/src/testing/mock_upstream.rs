//! Mock gateway upstream for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::gateway::{GatewayError, Upstream, UpstreamResponse};

/// Mock implementation of the gateway's `Upstream` trait.
///
/// Serves one configurable response for every URL and counts calls, so tests
/// can assert that a request was (or was not) forwarded.
pub struct MockUpstream {
    response: Mutex<UpstreamResponse>,
    error: Mutex<Option<String>>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            response: Mutex::new(UpstreamResponse {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: b"<html></html>".to_vec(),
            }),
            error: Mutex::new(None),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_body(&self, body: impl Into<String>) {
        if let Ok(mut response) = self.response.lock() {
            response.body = body.into().into_bytes();
        }
    }

    pub fn set_status(&self, status: u16) {
        if let Ok(mut response) = self.response.lock() {
            response.status = status;
        }
    }

    pub fn set_content_type(&self, content_type: Option<&str>) {
        if let Ok(mut response) = self.response.lock() {
            response.content_type = content_type.map(str::to_string);
        }
    }

    /// Make every following fetch fail with a transport error.
    pub fn fail_with(&self, message: &str) {
        if let Ok(mut error) = self.error.lock() {
            *error = Some(message.to_string());
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs fetched so far, in order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }

        if let Some(message) = self.error.lock().ok().and_then(|e| e.clone()) {
            return Err(GatewayError::Upstream(message));
        }

        self.response
            .lock()
            .map(|r| r.clone())
            .map_err(|e| GatewayError::Upstream(e.to_string()))
    }
}
