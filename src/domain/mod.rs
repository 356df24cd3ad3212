//! Domain layer containing business entities and repository contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Repository traits are implemented by `crate::infrastructure`.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures and the idempotency ledger model
//! - [`repositories`] - Data access trait definitions
//! - [`context`] - Per-request cancellation and deadline
//!
//! # Creation Flow
//!
//! 1. Handler parses the `X-Idempotency-Key` header into an [`entities::IdempotencyKey`]
//! 2. Service validates the payload, mints a UUIDv7 and (for short URLs) a unique slug
//! 3. Repository reserves the token and inserts the row in one retried transaction
//! 4. A replayed token resolves to the row the first request created

pub mod context;
pub mod entities;
pub mod repositories;
