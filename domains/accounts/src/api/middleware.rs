//! Accounts domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use gatehouse_auth::AuthBackend;
use gatehouse_common::{Config, PasswordHasher};
use gatehouse_email::EmailService;

use crate::repository::AccountStore;

/// Values the flows read from process configuration
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub app_name: String,
    /// Base URL of the client that serves the verification page
    pub client_url: String,
}

impl AccountSettings {
    /// Verification link mailed at sign-up
    pub fn verification_link(&self, token: &str) -> String {
        format!(
            "{}/verify?token={}",
            self.client_url.trim_end_matches('/'),
            token
        )
    }
}

impl From<&Config> for AccountSettings {
    fn from(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            client_url: config.client_url.clone(),
        }
    }
}

/// Application state for the Accounts domain
#[derive(Clone)]
pub struct AccountsState {
    pub accounts: Arc<dyn AccountStore>,
    pub auth: AuthBackend,
    pub email: Arc<dyn EmailService>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub settings: AccountSettings,
}

impl FromRef<AccountsState> for AuthBackend {
    fn from_ref(state: &AccountsState) -> Self {
        state.auth.clone()
    }
}
