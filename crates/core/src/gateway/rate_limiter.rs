//! Token bucket rate limiter, one bucket per client address.

use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use super::GatewayError;

/// Buckets are pruned once this many clients are tracked.
const PRUNE_THRESHOLD: usize = 10_000;

/// Token bucket rate limiter for a single client.
///
/// Tokens are added at a constant rate and consumed per request. The bucket
/// starts full, so a new client may burst up to the full per-minute budget.
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f32,
    /// Current available tokens.
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Try to acquire a token.
    ///
    /// Returns `Err(wait_duration)` if rate limited, with the time until the
    /// next token is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            Err(Duration::from_secs_f32(wait_secs))
        }
    }

    /// Whether the bucket has refilled completely (the client is idle).
    fn is_full(&mut self) -> bool {
        self.refill();
        self.tokens >= self.capacity
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Per-client rate limiter.
///
/// Thread-safe and async-compatible.
pub struct ClientRateLimiter {
    requests_per_minute: u32,
    buckets: RwLock<HashMap<IpAddr, TokenBucket>>,
}

impl ClientRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Try to acquire a token for `client`.
    ///
    /// Returns `Err(GatewayError::RateLimited)` when the client's budget is
    /// exhausted.
    pub async fn try_acquire(&self, client: IpAddr) -> Result<(), GatewayError> {
        let mut buckets = self.buckets.write().await;

        if buckets.len() >= PRUNE_THRESHOLD {
            buckets.retain(|_, bucket| !bucket.is_full());
        }

        let bucket = buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.requests_per_minute));

        bucket
            .try_acquire()
            .map_err(|wait| GatewayError::RateLimited {
                retry_after_ms: wait.as_millis() as u64,
            })
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}
