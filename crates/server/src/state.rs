//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::mail::Mailer;
use crate::models::User;
use crate::payments::PaymentGateway;
use crate::services::session::SessionTokens;
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds configuration and the external
/// collaborators behind their trait objects.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    tokens: SessionTokens,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = SessionTokens::new(&config.app_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
                mailer,
                tokens,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a handle to the data store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner.store)
    }

    /// Get a reference to the session token signer.
    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.inner.tokens
    }

    /// Build the per-request context for a resolved caller.
    #[must_use]
    pub fn request_context(&self, caller: Option<User>) -> RequestContext {
        RequestContext::new(
            caller,
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.gateway),
            Arc::clone(&self.inner.mailer),
        )
    }
}
