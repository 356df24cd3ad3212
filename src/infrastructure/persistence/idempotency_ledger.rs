//! PostgreSQL idempotency ledger.
//!
//! [`reserve`] is the single atomic insert-or-return-existing statement the
//! creation pipeline relies on; the unique constraint on `token` is the only
//! arbiter when two requests with the same token race.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::error::StoreError;
use crate::domain::entities::{IDEMPOTENCY_TTL_HOURS, IdempotencyClaim, IdempotencyRecord};

#[derive(sqlx::FromRow)]
struct IdempotencyRow {
    token: Uuid,
    reference_id: Uuid,
    request_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<IdempotencyRow> for IdempotencyRecord {
    fn from(row: IdempotencyRow) -> Self {
        IdempotencyRecord {
            token: row.token,
            reference_id: row.reference_id,
            request_hash: row.request_hash,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

/// Claims `claim.key` for `candidate_id`, or returns the live row that already owns it.
///
/// A live conflicting row is returned unchanged (first write wins). An expired
/// row is overwritten by this claim within the same statement.
pub async fn reserve(
    conn: &mut PgConnection,
    claim: &IdempotencyClaim,
    candidate_id: Uuid,
) -> Result<IdempotencyRecord, StoreError> {
    let row = sqlx::query_as::<_, IdempotencyRow>(
        r#"
        INSERT INTO idempotency_keys (id, token, reference_id, request_hash, created_at, expires_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW() + make_interval(hours => $5))
        ON CONFLICT (token) DO UPDATE SET
            id           = CASE WHEN idempotency_keys.expires_at <= NOW() THEN EXCLUDED.id           ELSE idempotency_keys.id           END,
            reference_id = CASE WHEN idempotency_keys.expires_at <= NOW() THEN EXCLUDED.reference_id ELSE idempotency_keys.reference_id END,
            request_hash = CASE WHEN idempotency_keys.expires_at <= NOW() THEN EXCLUDED.request_hash ELSE idempotency_keys.request_hash END,
            created_at   = CASE WHEN idempotency_keys.expires_at <= NOW() THEN EXCLUDED.created_at   ELSE idempotency_keys.created_at   END,
            expires_at   = CASE WHEN idempotency_keys.expires_at <= NOW() THEN EXCLUDED.expires_at   ELSE idempotency_keys.expires_at   END
        RETURNING token, reference_id, request_hash, created_at, expires_at
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(claim.key.as_uuid())
    .bind(candidate_id)
    .bind(&claim.request_hash)
    .bind(IDEMPOTENCY_TTL_HOURS)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

/// Counts of ledger rows, split by liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    pub live: i64,
    pub expired: i64,
}

/// Pool-level ledger maintenance used by the operator CLI.
pub struct PgIdempotencyLedger {
    pool: Arc<PgPool>,
}

impl PgIdempotencyLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Looks up the row for a token, live or expired.
    pub async fn find(&self, token: Uuid) -> Result<Option<IdempotencyRecord>, StoreError> {
        let row = sqlx::query_as::<_, IdempotencyRow>(
            r#"
            SELECT token, reference_id, request_hash, created_at, expires_at
            FROM idempotency_keys
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    /// Deletes every expired row and returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE expires_at <= NOW()")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> Result<LedgerStats, StoreError> {
        let (live, expired): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE expires_at > NOW()),
                COUNT(*) FILTER (WHERE expires_at <= NOW())
            FROM idempotency_keys
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LedgerStats { live, expired })
    }
}
