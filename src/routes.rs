//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`           - Short URL redirect
//! - `GET  /health`           - Health check: DB and cache
//! - `POST /api/v1/shorturl`  - Create a short URL
//! - `POST /api/v1/users`     - Register a user
//!
//! # Middleware
//!
//! - **Request id** - `x-request-id` assigned, logged and echoed back
//! - **Tracing** - Structured request/response logging
//! - **Panic recovery** - Handler panics become a 500 `internal_error`
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, recover, request_id, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   forwarding headers instead of the peer socket address; enable only when
///   the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let api_router = api::routes::v1_routes(state.clone());
    let api_router = if behind_proxy {
        api_router.layer(rate_limit::proxied_layer())
    } else {
        api_router.layer(rate_limit::layer())
    };

    let router = Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(with_request_layers(router))
}

/// Wraps `router` in the per-request layers shared by every route.
///
/// Outermost first: request id assignment, request id propagation, tracing,
/// panic recovery.
pub fn with_request_layers(router: Router) -> Router {
    router
        .layer(recover::layer())
        .layer(tracing::layer())
        .layer(request_id::propagate_layer())
        .layer(request_id::set_layer())
}
