//! Prometheus metrics for observability.
//!
//! This module provides HTTP request metrics for the server and registers
//! the core metrics (sources, gateway) in the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "anisearch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("anisearch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "anisearch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (sources, gateway)
    for metric in anisearch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

static HASH_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[0-9a-fA-F]{40}(/|$)").expect("valid hash regex"));
static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric regex"));

/// Normalize a path for metric labels (replace IDs with placeholders).
///
/// Static extension files collapse into one label so the label set stays
/// bounded.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with("/extensions/") && path != "/extensions/list" {
        return "/extensions/{file}".to_string();
    }

    let result = HASH_SEGMENT.replace_all(path, "/{hash}$1");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_hash() {
        let path = "/api/v1/nzb/a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
        assert_eq!(normalize_path(path), "/api/v1/nzb/{hash}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/sources/12345/test";
        assert_eq!(normalize_path(path), "/api/v1/sources/{id}/test");
    }

    #[test]
    fn test_normalize_path_extension_files() {
        assert_eq!(
            normalize_path("/extensions/animetosho/animetosho.js"),
            "/extensions/{file}"
        );
        assert_eq!(normalize_path("/extensions/list"), "/extensions/list");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/sources/nyaa/single"),
            "/api/v1/sources/nyaa/single"
        );
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("anisearch_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        anisearch_core::metrics::GATEWAY_CACHE_LOOKUPS
            .with_label_values(&["hit"])
            .inc();
        anisearch_core::metrics::GATEWAY_REJECTIONS
            .with_label_values(&["rate_limited"])
            .inc();
        anisearch_core::metrics::SOURCE_SEARCHES
            .with_label_values(&["nyaa", "single", "ok"])
            .inc();

        let output = encode_metrics().unwrap();

        assert!(output.contains("anisearch_http_request_duration_seconds"));
        assert!(output.contains("anisearch_http_requests_in_flight"));
        assert!(output.contains("anisearch_gateway_cache_lookups_total"));
        assert!(output.contains("anisearch_gateway_rejections_total"));
        assert!(output.contains("anisearch_source_searches_total"));
    }
}
