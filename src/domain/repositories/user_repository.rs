//! Repository trait for user accounts.

use crate::domain::context::OpContext;
use crate::domain::entities::{Creation, IdempotencyClaim, NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for user accounts.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Reserves the idempotency token and inserts the user in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::IdempotencyKeyReused`] on token reuse with a different
    /// body, [`AppError::Conflict`] if the username or email is taken, and
    /// [`AppError::Internal`] once retries are exhausted.
    async fn create_idempotent(
        &self,
        ctx: &OpContext,
        claim: IdempotencyClaim,
        new_user: NewUser,
    ) -> Result<Creation<User>, AppError>;
}
