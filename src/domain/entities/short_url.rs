//! Short URL entity mapping a slug to its destination.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored short URL.
///
/// Rows are written once by the creation pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrl {
    pub id: Uuid,
    pub destination_url: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl ShortUrl {
    /// Creates a new ShortUrl instance.
    pub fn new(id: Uuid, destination_url: String, slug: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            destination_url,
            slug,
            created_at,
        }
    }

    /// Joins the public base URL and the slug.
    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.slug)
    }
}

/// Input data for inserting a short URL.
///
/// The `id` is minted before persistence so the idempotency ledger can point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub id: Uuid,
    pub destination_url: String,
    pub slug: String,
}
