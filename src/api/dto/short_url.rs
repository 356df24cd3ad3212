//! DTOs for the short URL endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::ShortUrl;

/// Request to create a short URL.
///
/// A missing or `null` destination is accepted here and rejected by the
/// service with the same message as an empty one.
#[derive(Debug, Deserialize)]
pub struct CreateShortUrlRequest {
    #[serde(default)]
    pub destination_url: Option<String>,
}

/// A created or replayed short URL.
#[derive(Debug, Serialize)]
pub struct ShortUrlResponse {
    pub id: Uuid,
    pub destination_url: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    /// Fully qualified short URL, `BASE_URL/slug`.
    pub url: String,
}

impl ShortUrlResponse {
    pub fn from_entity(short_url: ShortUrl, base_url: &str) -> Self {
        let url = short_url.public_url(base_url);

        Self {
            id: short_url.id,
            destination_url: short_url.destination_url,
            slug: short_url.slug,
            created_at: short_url.created_at,
            url,
        }
    }
}
