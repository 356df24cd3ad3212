//! No-op cache used when Redis is not configured.

use super::service::RedirectCache;
use async_trait::async_trait;

/// A cache that never stores anything. Every lookup is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl RedirectCache for NullCache {
    async fn get_destination(&self, _slug: &str) -> Option<String> {
        None
    }

    async fn put_destination(&self, _slug: &str, _destination_url: &str) {}

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
