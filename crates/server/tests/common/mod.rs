//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, so the gateway and the source API can be
//! exercised without real upstreams.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use anisearch_core::testing::{MockSource, MockUpstream, MockUrlSource};
use anisearch_core::{Config, FetchGateway, Operation, SourceRegistry};
use anisearch_server::state::AppState;

/// Re-export fixtures for test convenience
pub use anisearch_core::testing::fixtures;

/// Info-hash the mock NZB source knows about.
pub const KNOWN_HASH: &str = "abcdef0123456789abcdef0123456789abcdef01";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with controllable mocks for:
/// - Gateway upstream (MockUpstream)
/// - Search providers (MockSource, registered as `alpha` and `beta`)
/// - NZB lookup (MockUrlSource)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_proxy() {
///     let fixture = TestFixture::new();
///     fixture.upstream.set_body("<html>hi</html>");
///
///     let response = fixture.get("/proxy?url=https%3A%2F%2Fnyaa.si%2F").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream behind the gateway
    pub upstream: Arc<MockUpstream>,
    /// Mock source with every operation (`alpha`)
    pub alpha: Arc<MockSource>,
    /// Mock source without `single`, reporting itself down (`beta`)
    pub beta: Arc<MockSource>,
    /// Extensions directory served under `/extensions`
    pub extensions_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let extensions_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.gateway.cache_ttl_ms = test_config.cache_ttl_ms;
        config.gateway.rate_limit_rpm = test_config.rate_limit_rpm;
        config.gateway.extensions_dir = extensions_dir.path().to_path_buf();

        let upstream = Arc::new(MockUpstream::new());
        let gateway = FetchGateway::new(&config.gateway, Arc::clone(&upstream) as _);

        let alpha = Arc::new(MockSource::new("alpha").with_results(vec![
            fixtures::result("[Group] Show - 01 [1080p]", KNOWN_HASH),
            fixtures::result(
                "[Other] Show - 01 [720p]",
                "0123456789abcdef0123456789abcdef01234567",
            ),
        ]));
        let beta = Arc::new(
            MockSource::new("beta")
                .without(Operation::Single)
                .alive(false),
        );
        let nzb = MockUrlSource::new().with_url(KNOWN_HASH, "https://nzb.example/file.nzb");

        let registry = SourceRegistry::new()
            .with_source("alpha", Arc::clone(&alpha) as _)
            .with_source("beta", Arc::clone(&beta) as _)
            .with_nzb(Arc::new(nzb));

        let state = Arc::new(AppState::new(config, registry, gateway));
        let router = anisearch_server::api::create_router(state);

        Self {
            router,
            upstream,
            alpha,
            beta,
            extensions_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Bytes,
    /// Body parsed as JSON, `Null` when it isn't JSON
    pub body: Value,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub cache_ttl_ms: u64,
    pub rate_limit_rpm: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 60_000,
            rate_limit_rpm: 1_000,
        }
    }
}

impl TestConfig {
    /// Config with a short cache TTL, for expiry tests.
    pub fn with_cache_ttl_ms(cache_ttl_ms: u64) -> Self {
        Self {
            cache_ttl_ms,
            ..Self::default()
        }
    }

    /// Config with a small per-client request budget.
    pub fn with_rate_limit(rate_limit_rpm: u32) -> Self {
        Self {
            rate_limit_rpm,
            ..Self::default()
        }
    }
}

/// Percent-encode a target URL for `/proxy?url=`.
pub fn proxy_path(target: &str) -> String {
    format!("/proxy?url={}", urlencoding::encode(target))
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status,
            $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            $response.text()
        );
    };
}
