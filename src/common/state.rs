// Application state shared across all modules

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::authenticator::Authenticator;
use crate::auth::oauth::OAuthProvider;
use crate::auth::reset::PasswordReset;
use crate::auth::session::SessionCodec;
use crate::common::AuthConfig;
use crate::services::Mailer;
use crate::store::UserStore;

/// Application state containing the store handle, session codec and providers.
///
/// Built once in `main` and handed to every router through an
/// `Extension<Arc<AppState>>`; nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
    pub config: Arc<AuthConfig>,
    pub sessions: SessionCodec,
    pub oauth_providers: HashMap<String, Arc<dyn OAuthProvider>>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(store: UserStore, config: AuthConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            sessions: SessionCodec::from_config(&config),
            config: Arc::new(config),
            oauth_providers: HashMap::new(),
            mailer,
        }
    }

    pub fn with_oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth_providers
            .insert(provider.name().to_string(), provider);
        self
    }

    pub fn oauth_provider(&self, name: &str) -> Option<Arc<dyn OAuthProvider>> {
        self.oauth_providers.get(name).cloned()
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.store.clone())
    }

    pub fn password_reset(&self) -> PasswordReset {
        PasswordReset::new(self.store.clone(), self.mailer.clone(), &self.config)
    }
}

/// State over an in-memory store with a fixed signing secret, for tests.
#[cfg(test)]
pub async fn test_state(mailer: Arc<dyn Mailer>) -> AppState {
    let config = AuthConfig {
        jwt_secret: "test_secret_key".to_string(),
        ..AuthConfig::default()
    };
    AppState::new(crate::store::test_store().await, config, mailer)
}
