//! Transaction seam between the retry executor and the database driver.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::error::StoreError;

/// Future returned by a unit of work; it may borrow the transaction for `'t`.
pub type TxFuture<'t, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 't>>;

/// A store that can open, commit and roll back transactions.
///
/// Dropping a `Tx` without committing must roll it back, so an attempt that
/// is abandoned mid-flight never leaves partial writes behind.
#[async_trait]
pub trait Transactional: Send + Sync {
    type Tx: Send + 'static;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Commits `tx`. On failure the transaction is already closed.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;
}

/// PostgreSQL transactions drawn from a shared pool.
#[derive(Clone)]
pub struct PgTransactions {
    pool: Arc<PgPool>,
}

impl PgTransactions {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

#[async_trait]
impl Transactional for PgTransactions {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        Ok(tx.rollback().await?)
    }
}
