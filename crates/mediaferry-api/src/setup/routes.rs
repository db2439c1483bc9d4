use crate::constants::API_PREFIX;
use crate::handlers::{health::health_check, ingest::ingest_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use mediaferry_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1_000)
        .max(1);

    // The multipart extractor has its own 2 MB default; the tower layer enforces the
    // configured limit for the whole body instead.
    let api_routes = Router::new()
        .route("/uploads", post(ingest_upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()));

    Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, api_routes)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
