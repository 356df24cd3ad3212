mod common;

use shurl::domain::entities::{IdempotencyClaim, IdempotencyKey};
use shurl::infrastructure::persistence::PgIdempotencyLedger;
use shurl::infrastructure::persistence::idempotency_ledger::{LedgerStats, reserve};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[sqlx::test]
async fn test_reserve_first_write_wins(pool: PgPool) {
    let key = IdempotencyKey::new(Uuid::now_v7());
    let claim = IdempotencyClaim::new(key, "hash-a".to_string());
    let first = Uuid::now_v7();
    let second = Uuid::now_v7();

    let mut conn = pool.acquire().await.unwrap();
    let record = reserve(&mut conn, &claim, first).await.unwrap();
    assert_eq!(record.reference_id, first);

    let record = reserve(&mut conn, &claim, second).await.unwrap();
    assert_eq!(record.reference_id, first);
    assert_eq!(record.request_hash, "hash-a");
}

#[sqlx::test]
async fn test_reserve_takes_over_expired_row(pool: PgPool) {
    let token = Uuid::now_v7();
    let stale = Uuid::now_v7();
    common::insert_ledger_row(&pool, token, stale, "old", -2).await;

    let claim = IdempotencyClaim::new(IdempotencyKey::new(token), "new".to_string());
    let candidate = Uuid::now_v7();

    let mut conn = pool.acquire().await.unwrap();
    let record = reserve(&mut conn, &claim, candidate).await.unwrap();

    assert_eq!(record.reference_id, candidate);
    assert_eq!(record.request_hash, "new");
    assert!(record.expires_at > record.created_at);
}

#[sqlx::test]
async fn test_purge_removes_only_expired(pool: PgPool) {
    common::insert_ledger_row(&pool, Uuid::now_v7(), Uuid::now_v7(), "a", -1).await;
    common::insert_ledger_row(&pool, Uuid::now_v7(), Uuid::now_v7(), "b", -48).await;
    let live = Uuid::now_v7();
    common::insert_ledger_row(&pool, live, Uuid::now_v7(), "c", 12).await;

    let ledger = PgIdempotencyLedger::new(Arc::new(pool.clone()));

    assert_eq!(
        ledger.stats().await.unwrap(),
        LedgerStats {
            live: 1,
            expired: 2
        }
    );

    assert_eq!(ledger.purge_expired().await.unwrap(), 2);
    assert_eq!(ledger.purge_expired().await.unwrap(), 0);

    assert!(ledger.find(live).await.unwrap().is_some());
    assert_eq!(common::count_rows(&pool, "idempotency_keys").await, 1);
}

#[sqlx::test]
async fn test_find_unknown_token(pool: PgPool) {
    let ledger = PgIdempotencyLedger::new(Arc::new(pool));
    assert!(ledger.find(Uuid::now_v7()).await.unwrap().is_none());
}
