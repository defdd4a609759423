use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use super::{extensions, handlers, middleware as mw, proxy, sources};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Sources
        .route("/sources", get(sources::list_sources))
        .route("/sources/{id}/test", get(sources::test_source))
        .route("/sources/{id}/{operation}", post(sources::search))
        .route("/nzb/{hash}", get(sources::nzb_lookup));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Listing plus static files; the listing route wins over a file named `list`
    let extension_routes = Router::new()
        .route("/list", get(extensions::list_extensions))
        .fallback_service(ServeDir::new(state.extensions_dir()));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/proxy", get(proxy::proxy))
        .nest("/extensions", extension_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            mw::rate_limit_middleware,
        ))
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
