//! Allowlisted fetch gateway.
//!
//! Forwards GET requests to a fixed set of upstream hosts and keeps recent
//! small responses in a TTL cache. The HTTP surface lives in the server
//! crate; this module owns the policy.

mod allowlist;
mod cache;
mod rate_limiter;

pub use allowlist::Allowlist;
pub use cache::{Lookup, ResponseCache};
pub use rate_limiter::{ClientRateLimiter, TokenBucket};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::metrics::{
    GATEWAY_CACHE_ENTRIES, GATEWAY_CACHE_LOOKUPS, GATEWAY_REJECTIONS, GATEWAY_UPSTREAM_FETCHES,
};

/// Errors that can occur while serving a gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing url param")]
    MissingUrl,

    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}

/// A raw upstream response, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A response served by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub response: UpstreamResponse,
    /// Whether the body came from the cache.
    pub cached: bool,
}

/// Something that can fetch a URL. Only transport failures are errors;
/// non-success statuses are passed through.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, GatewayError>;
}

/// Upstream backed by `reqwest`.
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Upstream(format!("failed to build client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, url: &str) -> Result<UpstreamResponse, GatewayError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Upstream("request timeout".to_string())
            } else {
                GatewayError::Upstream(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// The gateway itself: allowlist check, cache lookup, upstream fetch.
pub struct FetchGateway {
    allowlist: Allowlist,
    cache: Mutex<ResponseCache>,
    upstream: Arc<dyn Upstream>,
    max_cacheable_bytes: usize,
}

impl FetchGateway {
    pub fn new(config: &GatewayConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            allowlist: Allowlist::new(&config.allowlist),
            cache: Mutex::new(ResponseCache::new(
                Duration::from_millis(config.cache_ttl_ms),
                config.cache_max_entries,
            )),
            upstream,
            max_cacheable_bytes: config.max_cacheable_bytes,
        }
    }

    /// Gateway that fetches over HTTP with the configured User-Agent.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let upstream = HttpUpstream::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(config, Arc::new(upstream)))
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    /// Serve `target`, from cache when fresh.
    pub async fn fetch(&self, target: Option<&str>) -> Result<GatewayResponse, GatewayError> {
        let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
            GATEWAY_REJECTIONS.with_label_values(&["missing_url"]).inc();
            return Err(GatewayError::MissingUrl);
        };

        if let Err(e) = self.allowlist.check(target) {
            debug!(target = %target, "Host not allowed");
            GATEWAY_REJECTIONS
                .with_label_values(&["host_not_allowed"])
                .inc();
            return Err(e);
        }

        let lookup = self.cache.lock().await.get(target, Instant::now());
        match lookup {
            Lookup::Hit(response) => {
                GATEWAY_CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                debug!(target = %target, "Cache hit");
                return Ok(GatewayResponse {
                    response,
                    cached: true,
                });
            }
            Lookup::Expired => {
                GATEWAY_CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
            }
            Lookup::Miss => {
                GATEWAY_CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
            }
        }

        let response = match self.upstream.fetch(target).await {
            Ok(response) => {
                GATEWAY_UPSTREAM_FETCHES.with_label_values(&["ok"]).inc();
                response
            }
            Err(e) => {
                warn!(target = %target, error = %e, "Proxy fetch error");
                GATEWAY_UPSTREAM_FETCHES.with_label_values(&["error"]).inc();
                return Err(e);
            }
        };

        debug!(
            target = %target,
            status = response.status,
            bytes = response.body.len(),
            "Fetched upstream"
        );

        if response.body.len() < self.max_cacheable_bytes {
            let mut cache = self.cache.lock().await;
            cache.insert(target.to_string(), response.clone(), Instant::now());
            GATEWAY_CACHE_ENTRIES.set(cache.len() as i64);
        }

        Ok(GatewayResponse {
            response,
            cached: false,
        })
    }

    /// Number of cached responses.
    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}
