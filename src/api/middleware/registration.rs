//! Registration gate for account creation routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Rejects the request with 403 unless registration is enabled.
///
/// Applied as a route layer, so it runs before the handler's extractors and
/// a disabled endpoint never reads the body.
///
/// # Example
///
/// ```rust,ignore
/// let users = Router::new()
///     .route("/users", post(create_user_handler))
///     .route_layer(middleware::from_fn_with_state(state, registration::layer));
/// ```
pub async fn layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.allow_registration {
        return Err(AppError::forbidden(
            "User registration is disabled",
            json!({ "setting": "ALLOW_REGISTRATION" }),
        ));
    }

    Ok(next.run(req).await)
}
