//! Redis-backed redirect cache.

use super::service::{CacheError, CacheResult, RedirectCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "shurl:slug:";

/// Redis cache keyed by slug.
///
/// `ConnectionManager` reconnects on its own; clones share one multiplexed connection.
pub struct RedisCache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisCache {
    /// Connects to Redis and verifies the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("invalid Redis URL: {e}")))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        conn.ping::<()>()
            .await
            .map_err(|e| CacheError::Connection(format!("PING failed: {e}")))?;

        info!(ttl_seconds, "Connected to Redis");

        Ok(Self { conn, ttl_seconds })
    }

    fn key(slug: &str) -> String {
        format!("{KEY_PREFIX}{slug}")
    }
}

#[async_trait]
impl RedirectCache for RedisCache {
    async fn get_destination(&self, slug: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(Self::key(slug)).await {
            Ok(hit) => {
                debug!(slug, hit = hit.is_some(), "cache lookup");
                hit
            }
            Err(e) => {
                warn!(slug, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn put_destination(&self, slug: &str, destination_url: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(slug), destination_url, self.ttl_seconds)
            .await
        {
            warn!(slug, error = %e, "Redis SET failed");
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
