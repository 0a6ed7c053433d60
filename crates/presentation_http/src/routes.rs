//! Route definitions

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::{handlers, middleware::attach_identity, state::AppState};

/// Default JSON body ceiling for story requests
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    create_router_with_limit(state, DEFAULT_MAX_BODY_BYTES)
}

/// Router with an explicit request body limit
pub fn create_router_with_limit(state: AppState, max_body_bytes: usize) -> Router {
    // Quota-keyed routes resolve the caller and return their session id.
    let metered = Router::new()
        .route("/v1/quota", get(handlers::quota::get_quota))
        .route("/v1/stories", post(handlers::stories::create_story))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.identity),
            attach_identity,
        ));

    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Story API (v1)
        .route("/v1/catalog", get(handlers::catalog::get_catalog))
        .merge(metered)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
