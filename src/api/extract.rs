//! Request extractors that reject with the API error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::entities::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey, InvalidIdempotencyKey};
use crate::error::AppError;

/// The parsed `X-Idempotency-Key` header.
///
/// Runs before the body is read, so a bad token is reported even when the
/// body is also invalid.
#[derive(Debug, Clone, Copy)]
pub struct IdempotencyKeyHeader(pub IdempotencyKey);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKeyHeader {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let missing = || {
            AppError::bad_request(
                format!("Missing idempotency key header '{IDEMPOTENCY_KEY_HEADER}'"),
                json!({ "header": IDEMPOTENCY_KEY_HEADER }),
            )
        };
        let invalid = |e: InvalidIdempotencyKey| {
            AppError::bad_request(e.to_string(), json!({ "header": IDEMPOTENCY_KEY_HEADER }))
        };

        let value = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or_else(missing)?;
        // present but not visible ASCII can never be a UUID
        let raw = value.to_str().map_err(|_| invalid(InvalidIdempotencyKey))?;
        if raw.trim().is_empty() {
            return Err(missing());
        }

        raw.parse::<IdempotencyKey>().map(Self).map_err(invalid)
    }
}

/// JSON body whose decode failures become a `validation_error`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(
                "Invalid JSON body for request",
                json!({ "reason": rejection.body_text() }),
            )),
        }
    }
}
