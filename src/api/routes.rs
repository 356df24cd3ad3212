//! API route configuration.

use crate::api::handlers::{create_short_url_handler, create_user_handler};
use crate::api::middleware::registration;
use crate::state::AppState;
use axum::{Router, middleware, routing::post};

/// Versioned API routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `POST /v1/shorturl` - Create a short URL (idempotent)
/// - `POST /v1/users`    - Register a user (idempotent, gated by `ALLOW_REGISTRATION`)
pub fn v1_routes(state: AppState) -> Router<AppState> {
    let users = Router::new()
        .route("/v1/users", post(create_user_handler))
        .route_layer(middleware::from_fn_with_state(state, registration::layer));

    Router::new()
        .route("/v1/shorturl", post(create_short_url_handler))
        .merge(users)
}
