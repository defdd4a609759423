//! Rate limiting and metrics middleware.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use anisearch_core::metrics::GATEWAY_REJECTIONS;
use anisearch_core::GatewayError;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Per-client token-bucket rate limiting.
///
/// The client is identified by the peer address. Requests that arrive
/// without connection info (in-process tests) count as localhost.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let Err(e) = state.rate_limiter().try_acquire(client).await else {
        return next.run(request).await;
    };

    GATEWAY_REJECTIONS
        .with_label_values(&["rate_limited"])
        .inc();
    debug!(client = %client, error = %e, "Rate limited");

    let retry_after_secs = match e {
        GatewayError::RateLimited { retry_after_ms } => retry_after_ms.div_ceil(1000).max(1),
        _ => 1,
    };

    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        "too many requests",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use anisearch_core::{Config, FetchGateway, SourceRegistry};
    use anisearch_core::testing::MockUpstream;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn create_test_state(rate_limit_rpm: u32) -> Arc<AppState> {
        let mut config = Config::default();
        config.gateway.rate_limit_rpm = rate_limit_rpm;
        let gateway = FetchGateway::new(&config.gateway, Arc::new(MockUpstream::new()));
        Arc::new(AppState::new(config, SourceRegistry::new(), gateway))
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/test", get(dummy_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .with_state(state)
    }

    fn request_from(ip: [u8; 4]) -> Request<Body> {
        let mut request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        request
    }

    #[tokio::test]
    async fn test_requests_within_budget_pass() {
        let app = app(create_test_state(3));

        for _ in 0..3 {
            let response = app.clone().oneshot(request_from([10, 0, 0, 1])).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_429() {
        let app = app(create_test_state(2));

        for _ in 0..2 {
            app.clone().oneshot(request_from([10, 0, 0, 1])).await.unwrap();
        }

        let response = app.clone().oneshot(request_from([10, 0, 0, 1])).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));

        // Another client still has its own budget
        let response = app.oneshot(request_from([10, 0, 0, 2])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_connect_info_counts_as_localhost() {
        let state = create_test_state(1);
        let app = app(state.clone());

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from([127, 0, 0, 1])).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(state.rate_limiter().tracked_clients().await, 1);
    }
}
