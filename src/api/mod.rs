//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP surface of the console:
//! - Public blog endpoints under `/api`
//! - Gated admin endpoints under `/admin`
//! - Subscriber listing and CSV export
//! - Service health

pub mod admin;
pub mod blogs;
pub mod middleware;
pub mod site;
pub mod subscribers;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{AdminSession, ApiError, AppState, RequestStats};

/// Headroom for form fields around an inline image
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Admin routes, all behind the admin gate
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    // inline data URLs grow by a third once base64 encoded
    let body_limit = (state.config.upload.max_file_size as usize).saturating_mul(2) + BODY_LIMIT_OVERHEAD;

    Router::new()
        .merge(admin::router())
        .merge(subscribers::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors_origin = &state.config.server.cors_origin;
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("Ignoring invalid CORS origin '{}': {}", cors_origin, e),
    }

    Router::new()
        .nest("/api", blogs::router())
        .nest("/admin", build_admin_router(state.clone()))
        .merge(site::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // outermost, runs for all requests
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
