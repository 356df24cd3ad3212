//! Shared state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{ShortUrlService, UserService};
use crate::config::Config;
use crate::domain::context::OpContext;
use crate::infrastructure::cache::RedirectCache;
use crate::infrastructure::persistence::{
    PgShortUrlRepository, PgTransactions, PgUserRepository, RetryExecutor, RetryPolicy,
};

/// HTTP-facing settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub allow_registration: bool,
    pub request_timeout: Duration,
}

impl From<&Config> for HttpSettings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            allow_registration: config.allow_registration,
            request_timeout: config.request_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub short_url_service: Arc<ShortUrlService<PgShortUrlRepository>>,
    pub user_service: Arc<UserService<PgUserRepository>>,
    pub cache: Arc<dyn RedirectCache>,
    pub pool: Arc<PgPool>,
    pub base_url: Arc<str>,
    pub allow_registration: bool,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires both repositories onto one retry executor over `pool`.
    pub fn new(pool: Arc<PgPool>, cache: Arc<dyn RedirectCache>, settings: HttpSettings) -> Self {
        let executor = Arc::new(RetryExecutor::new(
            PgTransactions::new(pool.clone()),
            RetryPolicy::default(),
        ));

        let short_url_repository = Arc::new(PgShortUrlRepository::with_executor(executor.clone()));
        let user_repository = Arc::new(PgUserRepository::with_executor(executor));

        Self {
            short_url_service: Arc::new(ShortUrlService::new(short_url_repository)),
            user_service: Arc::new(UserService::new(user_repository)),
            cache,
            pool,
            base_url: settings.base_url.into(),
            allow_registration: settings.allow_registration,
            request_timeout: settings.request_timeout,
        }
    }

    /// A fresh context bounded by the request timeout.
    pub fn request_context(&self) -> OpContext {
        OpContext::with_timeout(self.request_timeout)
    }
}
