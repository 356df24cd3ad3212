//! Repository trait for short URL data access.

use crate::domain::context::OpContext;
use crate::domain::entities::{Creation, IdempotencyClaim, NewShortUrl, ShortUrl};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for short URLs.
///
/// Every operation runs inside the retrying transaction executor and honours
/// the caller's [`OpContext`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_short_url.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortUrlRepository: Send + Sync {
    /// Reserves the idempotency token and inserts the row in one transaction.
    ///
    /// Returns [`Creation::Replayed`] with the existing row when the token was
    /// already used with the same request body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::IdempotencyKeyReused`] if the token was used with a
    /// different body, [`AppError::Conflict`] if the slug is already taken, and
    /// [`AppError::Internal`] once retries are exhausted.
    async fn create_idempotent(
        &self,
        ctx: &OpContext,
        claim: IdempotencyClaim,
        new_short_url: NewShortUrl,
    ) -> Result<Creation<ShortUrl>, AppError>;

    /// Finds a short URL by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_slug(&self, ctx: &OpContext, slug: &str)
    -> Result<Option<ShortUrl>, AppError>;
}
