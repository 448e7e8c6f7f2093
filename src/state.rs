// src/state.rs

use std::sync::Arc;

use crate::{
    api::ApiClient,
    config::Config,
    routes::{HistoryNavigator, Navigator},
    services::{AttemptApi, AuthApi, QuizApi},
    session::auth::AuthSession,
    token::TokenStore,
};

/// Explicit dependency container handed to every view.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<ApiClient>,
    pub navigator: Arc<HistoryNavigator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let tokens = TokenStore::from_path(config.token_path.clone());
        let client = Arc::new(ApiClient::new(config.api_url.clone(), tokens));
        Self {
            client,
            navigator: Arc::new(HistoryNavigator::new()),
        }
    }

    pub fn tokens(&self) -> TokenStore {
        self.client.tokens().clone()
    }

    pub fn auth_api(&self) -> Arc<dyn AuthApi> {
        self.client.clone()
    }

    pub fn quiz_api(&self) -> Arc<dyn QuizApi> {
        self.client.clone()
    }

    pub fn attempt_api(&self) -> Arc<dyn AttemptApi> {
        self.client.clone()
    }

    pub fn navigator(&self) -> Arc<dyn Navigator> {
        self.navigator.clone()
    }

    /// A fresh auth session wired to this state's collaborators.
    pub fn auth_session(&self) -> AuthSession {
        AuthSession::new(self.auth_api(), self.tokens(), self.navigator())
    }
}
