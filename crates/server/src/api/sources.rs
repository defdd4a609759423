//! Source API handlers.
//!
//! A thin JSON surface over the source contract: liveness probes, the three
//! search operations and the NZB lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use anisearch_core::metrics::SOURCE_RESULTS;
use anisearch_core::{CanonicalResult, Operation, Query, SourceError};

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SourceStatus {
    pub source: String,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceStatus>,
    /// The NZB lookup provider, when one is configured.
    pub nzb: Option<SourceStatus>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub source: String,
    pub operation: Operation,
    pub results: Vec<CanonicalResult>,
}

#[derive(Debug, Serialize)]
pub struct NzbResponse {
    pub hash: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn source_error(e: SourceError) -> ApiError {
    let status = match e {
        SourceError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        SourceError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
    };
    error(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/sources
///
/// Every registered source with its liveness. Probes run concurrently.
pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
    let registry = state.sources();

    let probes = registry.iter().map(|(id, source)| {
        let id = id.to_string();
        let source = Arc::clone(source);
        async move {
            SourceStatus {
                ok: source.test().await,
                source: id,
            }
        }
    });

    let nzb_probe = async {
        match registry.nzb() {
            Some(nzb) => Some(SourceStatus {
                ok: nzb.test().await,
                source: nzb.name().to_string(),
            }),
            None => None,
        }
    };

    let (sources, nzb) = futures::join!(join_all(probes), nzb_probe);
    Json(SourcesResponse { sources, nzb })
}

/// GET /api/v1/sources/{id}/test
pub async fn test_source(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SourceStatus>, ApiError> {
    let Some(source) = state.sources().get(&id) else {
        return Err(error(
            StatusCode::NOT_FOUND,
            format!("Unknown source: {}", id),
        ));
    };

    let ok = source.test().await;
    Ok(Json(SourceStatus { source: id, ok }))
}

/// POST /api/v1/sources/{id}/{operation}
///
/// Run one search operation with a query body.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path((id, operation)): Path<(String, String)>,
    Json(query): Json<Query>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Some(source) = state.sources().get(&id) else {
        return Err(error(
            StatusCode::NOT_FOUND,
            format!("Unknown source: {}", id),
        ));
    };
    let operation: Operation = operation
        .parse()
        .map_err(|e: String| error(StatusCode::NOT_FOUND, e))?;

    debug!(source = %id, operation = %operation, titles = ?query.titles, "Source search");

    let results = source
        .search(operation, &query)
        .await
        .map_err(source_error)?;

    SOURCE_RESULTS
        .with_label_values(&[id.as_str()])
        .observe(results.len() as f64);

    Ok(Json(SearchResponse {
        source: id,
        operation,
        results,
    }))
}

/// GET /api/v1/nzb/{hash}
///
/// Resolve an info-hash to an NZB URL. `url` is null when the provider has
/// no NZB for it.
pub async fn nzb_lookup(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<NzbResponse>, ApiError> {
    let Some(nzb) = state.sources().nzb() else {
        return Err(error(
            StatusCode::NOT_FOUND,
            "NZB lookup not configured",
        ));
    };

    let url = nzb.search(&hash).await.map_err(source_error)?;
    Ok(Json(NzbResponse { hash, url }))
}
