//! Handler for user registration.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::user::{CreateUserRequest, UserResponse};
use crate::api::extract::{IdempotencyKeyHeader, JsonBody};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a user account.
///
/// # Endpoint
///
/// `POST /api/v1/users`
///
/// Guarded by [`crate::api::middleware::registration`]; answers 403 when
/// `ALLOW_REGISTRATION=false`.
///
/// # Request Body
///
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "correct horse",
///   "confirm_password": "correct horse"
/// }
/// ```
///
/// # Errors
///
/// - 400 `validation_error` with per-field details
/// - 400 `idempotency_key_reused` when the key was used with other details
/// - 409 `conflict` if the username or email is taken
pub async fn create_user_handler(
    State(state): State<AppState>,
    IdempotencyKeyHeader(key): IdempotencyKeyHeader,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let ctx = state.request_context();

    let user = state
        .user_service
        .create_user(&ctx, key, payload.into())
        .await?
        .into_inner();

    Ok((StatusCode::CREATED, Json(user.into())))
}
