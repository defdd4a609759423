//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sources (searches by operation and outcome, result counts)
//! - Gateway (cache lookups, upstream fetches, rejected requests)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Source Metrics
// =============================================================================

/// Source searches by source, operation and outcome.
pub static SOURCE_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("anisearch_source_searches_total", "Total source searches"),
        &["source", "operation", "outcome"], // outcome: "ok", "error"
    )
    .unwrap()
});

/// Results returned per search, after classification.
pub static SOURCE_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anisearch_source_results",
            "Number of results returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 15.0, 20.0, 50.0, 100.0]),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Gateway Metrics
// =============================================================================

/// Gateway cache lookups by result.
pub static GATEWAY_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisearch_gateway_cache_lookups_total",
            "Gateway cache lookups",
        ),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

/// Entries currently held in the gateway cache.
pub static GATEWAY_CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "anisearch_gateway_cache_entries",
        "Number of responses held in the gateway cache",
    )
    .unwrap()
});

/// Upstream fetches by outcome.
pub static GATEWAY_UPSTREAM_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisearch_gateway_upstream_fetches_total",
            "Upstream fetches made by the gateway",
        ),
        &["outcome"], // "ok", "error"
    )
    .unwrap()
});

/// Requests the gateway refused to forward.
pub static GATEWAY_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "anisearch_gateway_rejections_total",
            "Gateway requests rejected before any upstream fetch",
        ),
        &["reason"], // "missing_url", "host_not_allowed", "rate_limited"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sources
        Box::new(SOURCE_SEARCHES.clone()),
        Box::new(SOURCE_RESULTS.clone()),
        // Gateway
        Box::new(GATEWAY_CACHE_LOOKUPS.clone()),
        Box::new(GATEWAY_CACHE_ENTRIES.clone()),
        Box::new(GATEWAY_UPSTREAM_FETCHES.clone()),
        Box::new(GATEWAY_REJECTIONS.clone()),
    ]
}
