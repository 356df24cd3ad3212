//! User registration.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::context::OpContext;
use crate::domain::entities::{Creation, IdempotencyClaim, IdempotencyKey, NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::password::{Argon2Hasher, CredentialHasher};
use crate::utils::request_hash::user_request_hash;

/// Registration input after JSON decoding.
#[derive(Debug, Clone, Validate)]
pub struct Registration {
    #[validate(
        length(min = 3, message = "must be at least 3 characters"),
        custom(function = "lowercase_alphanumeric")
    )]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "must match password"))]
    pub confirm_password: String,
}

fn lowercase_alphanumeric(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset")
            .with_message(Cow::Borrowed("may only contain lowercase letters and digits")))
    }
}

/// Orchestrates idempotent account creation.
pub struct UserService<R: UserRepository, H: CredentialHasher = Argon2Hasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    next_id: fn() -> Uuid,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_sources(repository, Arc::new(Argon2Hasher), Uuid::now_v7)
    }
}

impl<R: UserRepository, H: CredentialHasher + 'static> UserService<R, H> {
    pub fn with_sources(repository: Arc<R>, hasher: Arc<H>, next_id: fn() -> Uuid) -> Self {
        Self {
            repository,
            hasher,
            next_id,
        }
    }

    /// Registers a user, or returns the account an earlier request with the
    /// same idempotency key created.
    ///
    /// The password is hashed on the blocking pool; the fingerprint stored
    /// with the key covers username and email only.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if any field fails validation. No store call is made.
    /// - [`AppError::IdempotencyKeyReused`] if `key` was first used with other details.
    /// - [`AppError::Conflict`] if the username or email is taken.
    pub async fn create_user(
        &self,
        ctx: &OpContext,
        key: IdempotencyKey,
        registration: Registration,
    ) -> Result<Creation<User>, AppError> {
        registration.validate()?;

        let password_hash = self.hash_password(registration.password).await?;
        let claim = IdempotencyClaim::new(
            key,
            user_request_hash(&registration.username, &registration.email),
        );

        let creation = self
            .repository
            .create_idempotent(
                ctx,
                claim,
                NewUser {
                    id: (self.next_id)(),
                    username: registration.username,
                    email: registration.email,
                    password_hash,
                },
            )
            .await?;

        info!(
            id = %creation.get().id,
            replay = creation.is_replay(),
            "user registration handled"
        );

        Ok(creation)
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = Arc::clone(&self.hasher);

        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "password hashing task failed");
                AppError::internal()
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUserRepository;
    use crate::utils::password::MockCredentialHasher;
    use chrono::Utc;
    use serde_json::json;

    fn registration() -> Registration {
        Registration {
            username: "alice42".to_string(),
            email: "alice@example.com".to_string(),
            password: "s3cretpass".to_string(),
            confirm_password: "s3cretpass".to_string(),
        }
    }

    fn key() -> IdempotencyKey {
        IdempotencyKey::new(Uuid::from_u128(99))
    }

    fn hasher() -> Arc<MockCredentialHasher> {
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash_password()
            .returning(|p| Ok(format!("hashed:{p}")));
        Arc::new(hasher)
    }

    fn user_from(new: NewUser) -> User {
        let now = Utc::now();
        User {
            id: new.id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_create_idempotent()
            .withf(|_, claim, new| {
                claim.request_hash == user_request_hash("alice42", "alice@example.com")
                    && new.id == Uuid::from_u128(5)
                    && new.password_hash == "hashed:s3cretpass"
            })
            .times(1)
            .returning(|_, _, new| Ok(Creation::Created(user_from(new))));

        let service = UserService::with_sources(Arc::new(repo), hasher(), || Uuid::from_u128(5));

        let creation = service
            .create_user(&OpContext::background(), key(), registration())
            .await
            .unwrap();

        assert!(!creation.is_replay());
        assert_eq!(creation.get().username, "alice42");
    }

    #[tokio::test]
    async fn test_validation_failures_skip_store() {
        let cases = [
            Registration {
                username: "al".to_string(),
                ..registration()
            },
            Registration {
                username: "Alice".to_string(),
                ..registration()
            },
            Registration {
                email: "not-an-email".to_string(),
                ..registration()
            },
            Registration {
                password: "short".to_string(),
                confirm_password: "short".to_string(),
                ..registration()
            },
            Registration {
                confirm_password: "different1".to_string(),
                ..registration()
            },
        ];

        for case in cases {
            let mut repo = MockUserRepository::new();
            repo.expect_create_idempotent().times(0);
            let mut hasher = MockCredentialHasher::new();
            hasher.expect_hash_password().times(0);

            let service =
                UserService::with_sources(Arc::new(repo), Arc::new(hasher), Uuid::now_v7);

            let err = service
                .create_user(&OpContext::background(), key(), case)
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_validation_details_name_the_field() {
        let service = UserService::with_sources(
            Arc::new(MockUserRepository::new()),
            hasher(),
            Uuid::now_v7,
        );

        let err = service
            .create_user(
                &OpContext::background(),
                key(),
                Registration {
                    username: "Bad Name".to_string(),
                    ..registration()
                },
            )
            .await
            .unwrap_err();

        let details = err.to_error_info().details;
        assert_eq!(
            details["username"][0],
            "may only contain lowercase letters and digits"
        );
    }

    #[tokio::test]
    async fn test_hash_failure_is_internal() {
        let mut repo = MockUserRepository::new();
        repo.expect_create_idempotent().times(0);

        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash_password()
            .returning(|_| Err(AppError::internal()));

        let service = UserService::with_sources(Arc::new(repo), Arc::new(hasher), Uuid::now_v7);

        let err = service
            .create_user(&OpContext::background(), key(), registration())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_conflict_propagates() {
        let mut repo = MockUserRepository::new();
        repo.expect_create_idempotent().returning(|_, _, _| {
            Err(AppError::conflict(
                "A user with that username or email already exists",
                json!({ "field": "username" }),
            ))
        });

        let service = UserService::with_sources(Arc::new(repo), hasher(), Uuid::now_v7);

        let err = service
            .create_user(&OpContext::background(), key(), registration())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }
}
