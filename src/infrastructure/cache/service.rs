//! Redirect cache trait and error types.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Slug → destination lookups in front of the database.
///
/// Short URLs are immutable once created, so entries never need invalidation;
/// they only age out by TTL. Implementations fail open: backend errors are
/// logged and surface as a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL
/// - [`crate::infrastructure::cache::NullCache`] - Caching disabled
#[async_trait]
pub trait RedirectCache: Send + Sync {
    /// Returns the cached destination for `slug`, `None` on miss or backend error.
    async fn get_destination(&self, slug: &str) -> Option<String>;

    /// Stores the destination for `slug` with the configured TTL.
    async fn put_destination(&self, slug: &str, destination_url: &str);

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;

    /// Human-readable backend name for the health report.
    fn backend(&self) -> &'static str;
}
