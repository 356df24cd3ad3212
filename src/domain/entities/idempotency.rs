//! Idempotency ledger types and resolution rules.
//!
//! A client sends the same `X-Idempotency-Key` on every retry of one logical
//! request. The ledger maps that token to the id of the resource the first
//! attempt created, so replays resolve to the same row instead of creating
//! another one.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Header carrying the client idempotency token.
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

/// How long a ledger row stays live after creation, in hours.
pub const IDEMPOTENCY_TTL_HOURS: i32 = 24;

/// A client-supplied idempotency token. Always a well-formed UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    pub fn new(token: Uuid) -> Self {
        Self(token)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

/// Error returned when a token is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("idempotency key provided is not a valid UUID")]
pub struct InvalidIdempotencyKey;

impl FromStr for IdempotencyKey {
    type Err = InvalidIdempotencyKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidIdempotencyKey)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A token together with the fingerprint of the request body it was sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyClaim {
    pub key: IdempotencyKey,
    pub request_hash: String,
}

impl IdempotencyClaim {
    pub fn new(key: IdempotencyKey, request_hash: String) -> Self {
        Self { key, request_hash }
    }
}

/// A live ledger row as returned by a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub token: Uuid,
    pub reference_id: Uuid,
    pub request_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of comparing a reservation against the caller's candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The caller's candidate won; insert the business row.
    Fresh,
    /// An earlier request with the same body already created this resource.
    Replay(Uuid),
    /// The token was first used with a different request body.
    Mismatch,
}

impl IdempotencyRecord {
    /// Decides what the caller should do after `reserve` returned this row.
    pub fn resolve(&self, candidate_id: Uuid, request_hash: &str) -> Resolution {
        if self.reference_id == candidate_id {
            Resolution::Fresh
        } else if self.request_hash == request_hash {
            Resolution::Replay(self.reference_id)
        } else {
            Resolution::Mismatch
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of an idempotent create: a new row, or the row an earlier request made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation<T> {
    Created(T),
    Replayed(T),
}

impl<T> Creation<T> {
    pub fn is_replay(&self) -> bool {
        matches!(self, Creation::Replayed(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Creation::Created(value) | Creation::Replayed(value) => value,
        }
    }

    pub fn get(&self) -> &T {
        match self {
            Creation::Created(value) | Creation::Replayed(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(reference_id: Uuid, request_hash: &str) -> IdempotencyRecord {
        let now = Utc::now();
        IdempotencyRecord {
            token: Uuid::now_v7(),
            reference_id,
            request_hash: request_hash.to_string(),
            created_at: now,
            expires_at: now + Duration::hours(IDEMPOTENCY_TTL_HOURS.into()),
        }
    }

    #[test]
    fn test_parse_valid_key() {
        let key: IdempotencyKey = "0191e2b4-7c3a-7b1e-9f4d-2a6c8e0b13f7".parse().unwrap();
        assert_eq!(key.to_string(), "0191e2b4-7c3a-7b1e-9f4d-2a6c8e0b13f7");
    }

    #[test]
    fn test_parse_rejects_surrounding_whitespace() {
        assert_eq!(
            " 0191e2b4-7c3a-7b1e-9f4d-2a6c8e0b13f7 ".parse::<IdempotencyKey>(),
            Err(InvalidIdempotencyKey)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<IdempotencyKey>(), Err(InvalidIdempotencyKey));
        assert_eq!("b3b1-7".parse::<IdempotencyKey>(), Err(InvalidIdempotencyKey));
    }

    #[test]
    fn test_resolve_fresh() {
        let id = Uuid::now_v7();
        assert_eq!(record(id, "h1").resolve(id, "h1"), Resolution::Fresh);
    }

    #[test]
    fn test_resolve_replay_same_body() {
        let original = Uuid::now_v7();
        let candidate = Uuid::now_v7();
        assert_eq!(
            record(original, "h1").resolve(candidate, "h1"),
            Resolution::Replay(original)
        );
    }

    #[test]
    fn test_resolve_mismatch_different_body() {
        let original = Uuid::now_v7();
        let candidate = Uuid::now_v7();
        assert_eq!(
            record(original, "h1").resolve(candidate, "h2"),
            Resolution::Mismatch
        );
    }

    #[test]
    fn test_record_expiry() {
        let rec = record(Uuid::now_v7(), "h");
        assert!(!rec.is_expired_at(Utc::now()));
        assert!(rec.is_expired_at(rec.expires_at));
    }

    #[test]
    fn test_creation_accessors() {
        let created = Creation::Created(1);
        let replayed = Creation::Replayed(2);

        assert!(!created.is_replay());
        assert!(replayed.is_replay());
        assert_eq!(*created.get(), 1);
        assert_eq!(replayed.into_inner(), 2);
    }
}
