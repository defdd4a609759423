//! Fetch gateway endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use anisearch_core::{GatewayError, GatewayResponse};

use crate::state::AppState;

/// Reports whether the body was served from the gateway cache.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

/// GET /proxy?url=<encoded target>
///
/// Forwards the request to an allowlisted host and mirrors the upstream
/// status, content type and body. Errors are plain text.
pub async fn proxy(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Response {
    match state.gateway().fetch(params.url.as_deref()).await {
        Ok(served) => upstream_response(served),
        Err(GatewayError::MissingUrl) => {
            (StatusCode::BAD_REQUEST, "missing url param").into_response()
        }
        Err(GatewayError::HostNotAllowed(_)) => {
            (StatusCode::FORBIDDEN, "host not allowed").into_response()
        }
        Err(GatewayError::RateLimited { .. }) => {
            (StatusCode::TOO_MANY_REQUESTS, "too many requests").into_response()
        }
        Err(GatewayError::Upstream(_)) => (StatusCode::BAD_GATEWAY, "bad gateway").into_response(),
    }
}

fn upstream_response(served: GatewayResponse) -> Response {
    let GatewayResponse { response, cached } = served;

    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        warn!(status = response.status, "Upstream returned an invalid status");
        StatusCode::BAD_GATEWAY
    });

    let mut reply = (status, Body::from(response.body)).into_response();
    let headers = reply.headers_mut();

    if let Some(value) = response
        .content_type
        .as_deref()
        .filter(|ct| !ct.is_empty())
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        X_CACHE.clone(),
        HeaderValue::from_static(if cached { "HIT" } else { "MISS" }),
    );

    reply
}
