//! Handler for short URL creation.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::short_url::{CreateShortUrlRequest, ShortUrlResponse};
use crate::api::extract::{IdempotencyKeyHeader, JsonBody};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /api/v1/shorturl`
///
/// # Headers
///
/// `X-Idempotency-Key: <uuid>` is required. Retrying with the same key and
/// destination returns the original short URL; reusing it with another
/// destination is rejected.
///
/// # Request Body
///
/// ```json
/// { "destination_url": "https://example.com" }
/// ```
///
/// # Response
///
/// `201 Created` for both the first call and its replays:
///
/// ```json
/// {
///   "id": "0191e2b4-7c3a-7b1e-9f4d-2a6c8e0b13f7",
///   "destination_url": "https://example.com",
///   "slug": "aZ93q",
///   "created_at": "2024-01-15T10:30:00Z",
///   "url": "https://sho.rt/aZ93q"
/// }
/// ```
///
/// # Errors
///
/// - 400 `validation_error` for a missing or malformed key, bad JSON, or a blank destination
/// - 400 `idempotency_key_reused` when the key was used with another destination
/// - 503 `service_unavailable` when no free slug could be found
/// - 500 `internal_error` on store failures
pub async fn create_short_url_handler(
    State(state): State<AppState>,
    IdempotencyKeyHeader(key): IdempotencyKeyHeader,
    JsonBody(payload): JsonBody<CreateShortUrlRequest>,
) -> Result<(StatusCode, Json<ShortUrlResponse>), AppError> {
    let ctx = state.request_context();
    let destination_url = payload.destination_url.unwrap_or_default();

    let short_url = state
        .short_url_service
        .create_short_url(&ctx, key, &destination_url)
        .await?
        .into_inner();

    Ok((
        StatusCode::CREATED,
        Json(ShortUrlResponse::from_entity(short_url, &state.base_url)),
    ))
}
