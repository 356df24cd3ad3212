//! PostgreSQL persistence: the retrying transaction executor, the idempotency
//! ledger and repository implementations.
//!
//! Queries use SQLx runtime-checked statements mapped through `FromRow` rows.
//!
//! # Components
//!
//! - [`error`] - [`StoreError`] and the transient-failure classifier
//! - [`transaction`] - [`Transactional`] seam and its PostgreSQL adapter
//! - [`retry`] - [`RetryExecutor`] with exponential backoff and jitter
//! - [`idempotency_ledger`] - Token reservation and expiry sweeping
//! - [`PgShortUrlRepository`] / [`PgUserRepository`] - Repository implementations

pub mod error;
pub mod idempotency_ledger;
pub mod pg_short_url_repository;
pub mod pg_user_repository;
pub mod retry;
pub mod transaction;

pub use error::{StoreError, StoreErrorKind};
pub use idempotency_ledger::PgIdempotencyLedger;
pub use pg_short_url_repository::PgShortUrlRepository;
pub use pg_user_repository::PgUserRepository;
pub use retry::{RetryExecutor, RetryPolicy};
pub use transaction::{PgTransactions, Transactional, TxFuture};
