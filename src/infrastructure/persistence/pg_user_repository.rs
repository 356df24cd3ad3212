//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{StoreError, StoreErrorKind};
use super::idempotency_ledger;
use super::retry::{RetryExecutor, RetryPolicy};
use super::transaction::PgTransactions;
use crate::domain::context::OpContext;
use crate::domain::entities::{Creation, IdempotencyClaim, NewUser, Resolution, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn insert(conn: &mut PgConnection, new_user: &NewUser) -> Result<User, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING id, username, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(new_user.id)
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

async fn fetch_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

/// PostgreSQL repository for user accounts.
pub struct PgUserRepository {
    executor: Arc<RetryExecutor<PgTransactions>>,
}

impl PgUserRepository {
    /// Creates a repository with the default retry policy.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_executor(Arc::new(RetryExecutor::new(
            PgTransactions::new(pool),
            RetryPolicy::default(),
        )))
    }

    pub fn with_executor(executor: Arc<RetryExecutor<PgTransactions>>) -> Self {
        Self { executor }
    }
}

fn map_error(err: StoreError) -> AppError {
    match err.kind() {
        StoreErrorKind::UniqueViolation { constraint } => {
            let field = match constraint.as_deref() {
                Some("users_username_key") => Some("username"),
                Some("users_email_key") => Some("email"),
                _ => None,
            };
            AppError::conflict(
                "A user with that username or email already exists",
                json!({ "field": field }),
            )
        }
        _ => err.into(),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_idempotent(
        &self,
        ctx: &OpContext,
        claim: IdempotencyClaim,
        new_user: NewUser,
    ) -> Result<Creation<User>, AppError> {
        self.executor
            .execute(ctx, move |tx| {
                let claim = claim.clone();
                let new_user = new_user.clone();
                Box::pin(async move {
                    let record =
                        idempotency_ledger::reserve(&mut **tx, &claim, new_user.id).await?;

                    match record.resolve(new_user.id, &claim.request_hash) {
                        Resolution::Fresh => {
                            insert(&mut **tx, &new_user).await.map(Creation::Created)
                        }
                        Resolution::Replay(existing_id) => {
                            match fetch_by_id(&mut **tx, existing_id).await? {
                                Some(existing) => Ok(Creation::Replayed(existing)),
                                None => Err(StoreError::idempotency_mismatch()),
                            }
                        }
                        Resolution::Mismatch => Err(StoreError::idempotency_mismatch()),
                    }
                })
            })
            .await
            .map_err(map_error)
    }
}
