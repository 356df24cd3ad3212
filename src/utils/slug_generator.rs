//! Random slug generation.
//!
//! Slugs are drawn uniformly from the 62 ASCII alphanumerics with a length
//! chosen uniformly in `4..=8`. Generation never consults the store; the
//! caller is responsible for checking uniqueness.

use rand::{Rng, distr::Alphanumeric};

/// Shortest slug the generator will produce.
pub const MIN_SLUG_LENGTH: usize = 4;

/// Longest slug the generator will produce. Matches the `slug` column width.
pub const MAX_SLUG_LENGTH: usize = 8;

/// Source of candidate slugs.
///
/// Production code uses [`SlugGenerator`]; tests substitute a mock or a
/// seeded generator to make the collision loop deterministic.
#[cfg_attr(test, mockall::automock)]
pub trait SlugSource: Send + Sync {
    fn next_slug(&self) -> String;
}

/// Generates slugs from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlugGenerator;

impl SlugGenerator {
    /// Generates a slug from an explicit random source.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use rand::{SeedableRng, rngs::StdRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let slug = SlugGenerator::generate_with(&mut rng);
    /// assert!((4..=8).contains(&slug.len()));
    /// ```
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
        let len = rng.random_range(MIN_SLUG_LENGTH..=MAX_SLUG_LENGTH);

        (0..len)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect()
    }
}

impl SlugSource for SlugGenerator {
    fn next_slug(&self) -> String {
        Self::generate_with(&mut rand::rng())
    }
}

/// Returns `true` if `slug` could have been produced by [`SlugGenerator`].
///
/// Redirect lookups use this to answer 404 without touching the store.
pub fn is_well_formed_slug(slug: &str) -> bool {
    (MIN_SLUG_LENGTH..=MAX_SLUG_LENGTH).contains(&slug.len())
        && slug.bytes().all(|b| b.is_ascii_alphanumeric())
}
