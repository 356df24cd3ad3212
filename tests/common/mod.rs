#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use shurl::infrastructure::cache::NullCache;
use shurl::state::{AppState, HttpSettings};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const BASE_URL: &str = "https://sho.rt";

pub fn settings(allow_registration: bool) -> HttpSettings {
    HttpSettings {
        base_url: BASE_URL.to_string(),
        allow_registration,
        request_timeout: Duration::from_secs(5),
    }
}

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::new(Arc::new(pool), Arc::new(NullCache), settings(true))
}

pub fn create_test_state_without_registration(pool: PgPool) -> AppState {
    AppState::new(Arc::new(pool), Arc::new(NullCache), settings(false))
}

pub fn idempotency_header() -> HeaderName {
    HeaderName::from_static("x-idempotency-key")
}

pub fn header_value(key: Uuid) -> HeaderValue {
    HeaderValue::from_str(&key.to_string()).unwrap()
}

pub async fn create_test_short_url(pool: &PgPool, slug: &str, destination_url: &str) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO short_urls (id, destination_url, slug) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(destination_url)
        .bind(slug)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn count_rows(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Inserts a ledger row directly, `expires_in_hours` may be negative.
pub async fn insert_ledger_row(
    pool: &PgPool,
    token: Uuid,
    reference_id: Uuid,
    request_hash: &str,
    expires_in_hours: i32,
) {
    sqlx::query(
        r#"
        INSERT INTO idempotency_keys (id, token, reference_id, request_hash, created_at, expires_at)
        VALUES ($1, $2, $3, $4, NOW() - INTERVAL '25 hours', NOW() + make_interval(hours => $5))
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(token)
    .bind(reference_id)
    .bind(request_hash)
    .bind(expires_in_hours)
    .execute(pool)
    .await
    .unwrap();
}
