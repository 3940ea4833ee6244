//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::RosewoodConfig;
use crate::services::email::EmailService;
use crate::services::kv::KvStore;
use crate::services::reminds::RemindService;
use crate::services::tokens::ConfirmTokens;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RosewoodConfig,
    pool: PgPool,
    kv: KvStore,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Outgoing mail is disabled (links are logged) when SMTP is not
    /// configured or the relay cannot be set up.
    #[must_use]
    pub fn new(config: RosewoodConfig, pool: PgPool) -> Self {
        let email = config
            .email
            .as_ref()
            .and_then(|email_config| match EmailService::new(email_config) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to set up SMTP relay, outgoing mail disabled");
                    None
                }
            });

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                kv: KvStore::new(),
                email,
            }),
        }
    }

    /// Get a reference to the marketplace configuration.
    #[must_use]
    pub fn config(&self) -> &RosewoodConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the key-value store.
    #[must_use]
    pub fn kv(&self) -> &KvStore {
        &self.inner.kv
    }

    /// The email service, when outgoing mail is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Reminds stored in the key-value store.
    #[must_use]
    pub fn reminds(&self) -> RemindService<'_> {
        RemindService::new(&self.inner.kv)
    }

    /// Emailed confirmation tokens, signed with the session secret.
    #[must_use]
    pub fn confirm_tokens(&self) -> ConfirmTokens<'_> {
        ConfirmTokens::new(
            &self.inner.kv,
            &self.inner.config.session_secret,
            self.inner.config.confirm_token_ttl,
        )
    }

    /// Base URL for stored media paths.
    #[must_use]
    pub fn media_base(&self) -> &str {
        &self.inner.config.media_url
    }
}
