//! Application layer services implementing business logic.
//!
//! Services validate input, mint ids and slugs, and hand the write to a
//! repository that runs it inside the retrying transaction executor.
//!
//! # Available Services
//!
//! - [`services::short_url_service::ShortUrlService`] - Short URL creation and lookup
//! - [`services::user_service::UserService`] - Account registration

pub mod services;
