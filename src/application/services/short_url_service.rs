//! Short URL creation and lookup.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::context::OpContext;
use crate::domain::entities::{Creation, IdempotencyClaim, IdempotencyKey, NewShortUrl, ShortUrl};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;
use crate::utils::request_hash::short_url_request_hash;
use crate::utils::slug_generator::{SlugGenerator, SlugSource, is_well_formed_slug};

/// Upper bound on slug candidates tried before giving up.
pub const MAX_SLUG_ATTEMPTS: usize = 10;

/// Orchestrates idempotent short URL creation.
///
/// The service validates the destination, mints the row id, picks a slug that
/// is not yet taken, and hands everything to the repository, which reserves
/// the idempotency token and inserts the row in one retried transaction.
pub struct ShortUrlService<R: ShortUrlRepository, S: SlugSource = SlugGenerator> {
    repository: Arc<R>,
    slugs: S,
    next_id: fn() -> Uuid,
}

impl<R: ShortUrlRepository> ShortUrlService<R> {
    /// Creates a service using random slugs and UUIDv7 ids.
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_sources(repository, SlugGenerator, Uuid::now_v7)
    }
}

impl<R: ShortUrlRepository, S: SlugSource> ShortUrlService<R, S> {
    /// Creates a service with explicit slug and id sources.
    pub fn with_sources(repository: Arc<R>, slugs: S, next_id: fn() -> Uuid) -> Self {
        Self {
            repository,
            slugs,
            next_id,
        }
    }

    /// Creates a short URL, or returns the one an earlier request with the
    /// same idempotency key created.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the destination is blank. No store call is made.
    /// - [`AppError::IdempotencyKeyReused`] if `key` was first used with another destination.
    /// - [`AppError::CapacityExhausted`] if no free slug was found.
    /// - [`AppError::Internal`] on store failures after retries.
    pub async fn create_short_url(
        &self,
        ctx: &OpContext,
        key: IdempotencyKey,
        destination_url: &str,
    ) -> Result<Creation<ShortUrl>, AppError> {
        let destination_url = destination_url.trim();
        if destination_url.is_empty() {
            return Err(AppError::bad_request(
                "`destination_url` cannot be null or empty",
                json!({ "field": "destination_url" }),
            ));
        }

        let id = (self.next_id)();
        let slug = self.generate_unique_slug(ctx).await?;
        let claim = IdempotencyClaim::new(key, short_url_request_hash(destination_url));

        let creation = self
            .repository
            .create_idempotent(
                ctx,
                claim,
                NewShortUrl {
                    id,
                    destination_url: destination_url.to_string(),
                    slug,
                },
            )
            .await?;

        match &creation {
            Creation::Created(short_url) => {
                info!(id = %short_url.id, slug = %short_url.slug, "short url created")
            }
            Creation::Replayed(short_url) => info!(
                id = %short_url.id,
                slug = %short_url.slug,
                idempotency_key = %key,
                "idempotent replay"
            ),
        }

        Ok(creation)
    }

    /// Looks up the destination for a slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug is malformed or unknown.
    pub async fn resolve_slug(&self, ctx: &OpContext, slug: &str) -> Result<ShortUrl, AppError> {
        if !is_well_formed_slug(slug) {
            return Err(slug_not_found(slug));
        }

        self.repository
            .find_by_slug(ctx, slug)
            .await?
            .ok_or_else(|| slug_not_found(slug))
    }

    /// Tries up to [`MAX_SLUG_ATTEMPTS`] candidates and returns the first free one.
    ///
    /// The check is advisory: a concurrent insert can still take the slug, in
    /// which case the unique constraint rejects the write with a conflict.
    async fn generate_unique_slug(&self, ctx: &OpContext) -> Result<String, AppError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = self.slugs.next_slug();

            if self.repository.find_by_slug(ctx, &slug).await?.is_none() {
                return Ok(slug);
            }
        }

        warn!(attempts = MAX_SLUG_ATTEMPTS, "no free slug found");
        Err(AppError::capacity_exhausted(
            "Could not allocate a short URL, please try again later",
            json!({ "attempts": MAX_SLUG_ATTEMPTS }),
        ))
    }
}

fn slug_not_found(slug: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "slug": slug }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortUrlRepository;
    use crate::utils::slug_generator::MockSlugSource;
    use chrono::Utc;
    use mockall::Sequence;

    const FIXED_ID: Uuid = Uuid::from_u128(0x0191e2b4_7c3a_7b1e_9f4d_2a6c8e0b13f7);

    fn fixed_id() -> Uuid {
        FIXED_ID
    }

    fn key() -> IdempotencyKey {
        IdempotencyKey::new(Uuid::from_u128(42))
    }

    fn short_url(id: Uuid, slug: &str, destination: &str) -> ShortUrl {
        ShortUrl::new(id, destination.to_string(), slug.to_string(), Utc::now())
    }

    fn slugs(values: &[&'static str]) -> MockSlugSource {
        let mut source = MockSlugSource::new();
        let mut seq = Sequence::new();
        for value in values {
            source
                .expect_next_slug()
                .times(1)
                .in_sequence(&mut seq)
                .return_const(value.to_string());
        }
        source
    }

    #[tokio::test]
    async fn test_create_success() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug()
            .withf(|_, slug| slug == "aZ93")
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_create_idempotent()
            .withf(|_, claim, new| {
                claim.key == key()
                    && claim.request_hash == short_url_request_hash("https://example.com")
                    && new.id == FIXED_ID
                    && new.slug == "aZ93"
                    && new.destination_url == "https://example.com"
            })
            .times(1)
            .returning(|_, _, new| {
                Ok(Creation::Created(short_url(
                    new.id,
                    &new.slug,
                    &new.destination_url,
                )))
            });

        let service = ShortUrlService::with_sources(Arc::new(repo), slugs(&["aZ93"]), fixed_id);

        let creation = service
            .create_short_url(&OpContext::background(), key(), "https://example.com")
            .await
            .unwrap();

        assert!(!creation.is_replay());
        assert_eq!(creation.get().id, FIXED_ID);
        assert_eq!(creation.get().slug, "aZ93");
    }

    #[tokio::test]
    async fn test_create_trims_destination() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug().returning(|_, _| Ok(None));
        repo.expect_create_idempotent()
            .withf(|_, _, new| new.destination_url == "https://example.com/a")
            .times(1)
            .returning(|_, _, new| {
                Ok(Creation::Created(short_url(
                    new.id,
                    &new.slug,
                    &new.destination_url,
                )))
            });

        let service = ShortUrlService::with_sources(Arc::new(repo), slugs(&["Qw12"]), fixed_id);

        let result = service
            .create_short_url(&OpContext::background(), key(), "  https://example.com/a\n")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_destination_without_store_calls() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_slug().times(0);
        repo.expect_create_idempotent().times(0);

        let mut source = MockSlugSource::new();
        source.expect_next_slug().times(0);

        let service = ShortUrlService::with_sources(Arc::new(repo), source, fixed_id);

        for blank in ["", "   ", "\t\n"] {
            let err = service
                .create_short_url(&OpContext::background(), key(), blank)
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::Validation { .. }));
            assert_eq!(err.to_string(), "`destination_url` cannot be null or empty");
        }
    }

    #[tokio::test]
    async fn test_create_replay_returns_original_row() {
        let original_id = Uuid::from_u128(7);
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug().returning(|_, _| Ok(None));
        repo.expect_create_idempotent()
            .times(1)
            .returning(move |_, _, _| {
                Ok(Creation::Replayed(short_url(
                    original_id,
                    "orig",
                    "https://example.com",
                )))
            });

        let service = ShortUrlService::with_sources(Arc::new(repo), slugs(&["newS"]), fixed_id);

        let creation = service
            .create_short_url(&OpContext::background(), key(), "https://example.com")
            .await
            .unwrap();

        assert!(creation.is_replay());
        assert_eq!(creation.get().id, original_id);
        assert_eq!(creation.get().slug, "orig");
    }

    #[tokio::test]
    async fn test_create_propagates_key_reuse() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug().returning(|_, _| Ok(None));
        repo.expect_create_idempotent()
            .times(1)
            .returning(|_, _, _| Err(AppError::idempotency_key_reused(json!({}))));

        let service = ShortUrlService::with_sources(Arc::new(repo), slugs(&["abcd"]), fixed_id);

        let err = service
            .create_short_url(&OpContext::background(), key(), "https://other.example")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::IdempotencyKeyReused { .. }));
    }

    #[tokio::test]
    async fn test_slug_collision_retries_with_new_candidate() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug()
            .withf(|_, slug| slug == "taken")
            .times(1)
            .returning(|_, slug| {
                Ok(Some(short_url(
                    Uuid::from_u128(1),
                    slug,
                    "https://x.example",
                )))
            });
        repo.expect_find_by_slug()
            .withf(|_, slug| slug == "free")
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_create_idempotent()
            .withf(|_, _, new| new.slug == "free")
            .times(1)
            .returning(|_, _, new| {
                Ok(Creation::Created(short_url(
                    new.id,
                    &new.slug,
                    &new.destination_url,
                )))
            });

        let service =
            ShortUrlService::with_sources(Arc::new(repo), slugs(&["taken", "free"]), fixed_id);

        let creation = service
            .create_short_url(&OpContext::background(), key(), "https://example.com")
            .await
            .unwrap();

        assert_eq!(creation.get().slug, "free");
    }

    #[tokio::test]
    async fn test_slug_space_exhausted() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug()
            .times(MAX_SLUG_ATTEMPTS)
            .returning(|_, slug| {
                Ok(Some(short_url(
                    Uuid::from_u128(1),
                    slug,
                    "https://x.example",
                )))
            });
        repo.expect_create_idempotent().times(0);

        let mut source = MockSlugSource::new();
        source
            .expect_next_slug()
            .times(MAX_SLUG_ATTEMPTS)
            .returning(|| "dupe".to_string());

        let service = ShortUrlService::with_sources(Arc::new(repo), source, fixed_id);

        let err = service
            .create_short_url(&OpContext::background(), key(), "https://example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CapacityExhausted { .. }));
    }

    #[tokio::test]
    async fn test_resolve_slug_found() {
        let mut repo = MockShortUrlRepository::new();

        repo.expect_find_by_slug()
            .withf(|_, slug| slug == "aZ93q")
            .times(1)
            .returning(|_, slug| {
                Ok(Some(short_url(
                    Uuid::from_u128(3),
                    slug,
                    "https://example.com",
                )))
            });

        let service = ShortUrlService::new(Arc::new(repo));

        let found = service
            .resolve_slug(&OpContext::background(), "aZ93q")
            .await
            .unwrap();

        assert_eq!(found.destination_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_resolve_slug_unknown() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_slug().times(1).returning(|_, _| Ok(None));

        let service = ShortUrlService::new(Arc::new(repo));

        let err = service
            .resolve_slug(&OpContext::background(), "nope1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_malformed_slug_skips_store() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_slug().times(0);

        let service = ShortUrlService::new(Arc::new(repo));

        for slug in ["abc", "waytoolong", "ab-d"] {
            let err = service
                .resolve_slug(&OpContext::background(), slug)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound { .. }));
        }
    }
}
