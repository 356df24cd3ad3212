//! PostgreSQL implementation of the short URL repository.

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
use crate::domain::entities::{Creation, IdempotencyClaim, NewShortUrl, Resolution, ShortUrl};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    id: Uuid,
    destination_url: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(row: ShortUrlRow) -> Self {
        ShortUrl::new(row.id, row.destination_url, row.slug, row.created_at)
    }
}

async fn insert(conn: &mut PgConnection, new_short_url: &NewShortUrl) -> Result<ShortUrl, StoreError> {
    let row = sqlx::query_as::<_, ShortUrlRow>(
        r#"
        INSERT INTO short_urls (id, destination_url, slug, created_at)
        VALUES ($1, $2, $3, NOW())
        RETURNING id, destination_url, slug, created_at
        "#,
    )
    .bind(new_short_url.id)
    .bind(&new_short_url.destination_url)
    .bind(&new_short_url.slug)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

async fn fetch_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<ShortUrl>, StoreError> {
    let row = sqlx::query_as::<_, ShortUrlRow>(
        "SELECT id, destination_url, slug, created_at FROM short_urls WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

async fn fetch_by_slug(conn: &mut PgConnection, slug: &str) -> Result<Option<ShortUrl>, StoreError> {
    let row = sqlx::query_as::<_, ShortUrlRow>(
        "SELECT id, destination_url, slug, created_at FROM short_urls WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Into::into))
}

/// PostgreSQL repository for short URLs.
///
/// All statements run through a [`RetryExecutor`], one transaction per attempt.
pub struct PgShortUrlRepository {
    executor: Arc<RetryExecutor<PgTransactions>>,
}

impl PgShortUrlRepository {
    /// Creates a repository with the default retry policy.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_executor(Arc::new(RetryExecutor::new(
            PgTransactions::new(pool),
            RetryPolicy::default(),
        )))
    }

    /// Creates a repository sharing an existing executor.
    pub fn with_executor(executor: Arc<RetryExecutor<PgTransactions>>) -> Self {
        Self { executor }
    }
}

fn map_error(err: StoreError) -> AppError {
    match err.kind() {
        StoreErrorKind::UniqueViolation { constraint } => {
            tracing::warn!(constraint = ?constraint, "short url insert hit a unique constraint");
            AppError::conflict(
                "Slug is already in use, please retry",
                json!({ "field": "slug" }),
            )
        }
        _ => err.into(),
    }
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn create_idempotent(
        &self,
        ctx: &OpContext,
        claim: IdempotencyClaim,
        new_short_url: NewShortUrl,
    ) -> Result<Creation<ShortUrl>, AppError> {
        self.executor
            .execute(ctx, move |tx| {
                let claim = claim.clone();
                let new_short_url = new_short_url.clone();
                Box::pin(async move {
                    let record =
                        idempotency_ledger::reserve(&mut **tx, &claim, new_short_url.id).await?;

                    match record.resolve(new_short_url.id, &claim.request_hash) {
                        Resolution::Fresh => insert(&mut **tx, &new_short_url)
                            .await
                            .map(Creation::Created),
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

    async fn find_by_slug(
        &self,
        ctx: &OpContext,
        slug: &str,
    ) -> Result<Option<ShortUrl>, AppError> {
        let slug = slug.to_owned();
        self.executor
            .execute(ctx, move |tx| {
                let slug = slug.clone();
                Box::pin(async move { fetch_by_slug(&mut **tx, &slug).await })
            })
            .await
            .map_err(map_error)
    }
}
