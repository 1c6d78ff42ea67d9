//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::{PasswordError, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::Store;

/// Cheaply cloneable handle to everything handlers need.
///
/// Built once at startup; read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    tokens: TokenService,
    passwords: PasswordHasher,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, PasswordError> {
        let tokens = TokenService::new(&config.security.jwt_secret, config.token_ttl());
        let passwords = PasswordHasher::new(
            config.security.password_memory_kib,
            config.security.password_iterations,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                passwords,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn passwords(&self) -> &PasswordHasher {
        &self.inner.passwords
    }
}
