//! Business logic services for the application layer.

pub mod short_url_service;
pub mod user_service;

pub use short_url_service::ShortUrlService;
pub use user_service::{Registration, UserService};
