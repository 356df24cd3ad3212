//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its destination.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Request Flow
///
/// 1. Check the redirect cache
/// 2. On a miss, resolve the slug through the service (malformed slugs are
///    rejected without a store query)
/// 3. Populate the cache in the background
/// 4. Return 307 Temporary Redirect
///
/// # Errors
///
/// Returns 404 Not Found if the slug doesn't exist.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    if let Some(destination_url) = state.cache.get_destination(&slug).await {
        debug!(%slug, "cache hit");
        return Ok(Redirect::temporary(&destination_url));
    }

    debug!(%slug, "cache miss");

    let ctx = state.request_context();
    let short_url = state.short_url_service.resolve_slug(&ctx, &slug).await?;

    let cache = state.cache.clone();
    let destination_url = short_url.destination_url.clone();
    tokio::spawn(async move {
        cache.put_destination(&slug, &destination_url).await;
    });

    Ok(Redirect::temporary(&short_url.destination_url))
}
