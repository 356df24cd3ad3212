//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`ShortUrl`] - A slug mapped to a destination URL
//! - [`User`] - A registered account
//! - [`IdempotencyRecord`] - A ledger row binding a client token to a created resource
//!
//! Creation inputs are separate structs (`NewShortUrl`, `NewUser`) carrying the
//! server-minted id assigned before persistence.

pub mod idempotency;
pub mod short_url;
pub mod user;

pub use idempotency::{
    Creation, IDEMPOTENCY_KEY_HEADER, IDEMPOTENCY_TTL_HOURS, IdempotencyClaim, IdempotencyKey,
    IdempotencyRecord, InvalidIdempotencyKey, Resolution,
};
pub use short_url::{NewShortUrl, ShortUrl};
pub use user::{NewUser, User};
