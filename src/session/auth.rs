// src/session/auth.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginForm, SignupForm, User},
    routes::{Navigator, Route},
    services::AuthApi,
    token::TokenStore,
};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Stored token not checked yet.
    Unknown,
    Authenticated,
    Anonymous,
}

/// Current user plus the login/signup/logout flows.
pub struct AuthSession {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    user: Option<User>,
    is_loading: bool,
    error: Option<String>,
}

impl AuthSession {
    pub fn new(api: Arc<dyn AuthApi>, tokens: TokenStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            tokens,
            navigator,
            user: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn status(&self) -> AuthStatus {
        if self.is_loading && self.user.is_none() {
            AuthStatus::Unknown
        } else if self.user.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    /// Validates the stored token and loads the current user.
    /// Any failure clears the token and leaves the session anonymous.
    pub async fn restore(&mut self) -> AuthStatus {
        self.is_loading = true;
        if self.tokens.is_valid() {
            match self.api.current_user().await {
                Ok(user) => {
                    tracing::info!("Restored session for '{}'", user.username);
                    self.user = Some(user);
                }
                Err(e) => {
                    tracing::warn!("Stored token rejected: {}", e);
                    self.clear_credentials();
                }
            }
        } else if self.tokens.read().is_some() {
            tracing::info!("Stored token expired");
            self.clear_credentials();
        }
        self.is_loading = false;
        self.status()
    }

    /// Signs in, stores the token, loads the user, then navigates to the dashboard.
    pub async fn login(&mut self, form: LoginForm) -> Result<&User, AppError> {
        form.validate()?;

        self.is_loading = true;
        self.error = None;
        let result = self.sign_in_and_load(&form).await;
        self.is_loading = false;

        match result {
            Ok(()) => self.enter_dashboard(),
            Err(e) => Err(self.fail(e, LOGIN_FAILED)),
        }
    }

    /// Registers, then logs in with the same username and password.
    pub async fn signup(&mut self, form: SignupForm) -> Result<&User, AppError> {
        form.validate()?;

        self.is_loading = true;
        self.error = None;
        let created = self.api.sign_up(&form.payload()).await;
        let result = match created {
            Ok(created) => {
                tracing::info!("Registered user '{}'", created.username);
                self.sign_in_and_load(&form.login_form()).await
            }
            Err(e) => Err(e),
        };
        self.is_loading = false;

        match result {
            Ok(()) => self.enter_dashboard(),
            Err(e) => Err(self.fail(e, SIGNUP_FAILED)),
        }
    }

    /// Clears the token and user, then navigates home. Safe to call repeatedly.
    pub fn logout(&mut self) {
        self.clear_credentials();
        self.is_loading = false;
        self.navigator.navigate(Route::Home);
    }

    async fn sign_in_and_load(&mut self, form: &LoginForm) -> Result<(), AppError> {
        let auth = self.api.sign_in(form).await?;
        self.tokens.save(&auth.access_token);
        let user = self.api.current_user().await?;
        tracing::info!("Logged in as '{}'", user.username);
        self.user = Some(user);
        Ok(())
    }

    fn enter_dashboard(&mut self) -> Result<&User, AppError> {
        self.navigator.navigate(Route::Dashboard);
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Internal("user missing after login".to_string()))
    }

    fn fail(&mut self, err: AppError, fallback: &str) -> AppError {
        // A token saved before a failed user fetch must not outlive the attempt
        if self.user.is_none() {
            self.tokens.remove();
        }
        let message = err.message();
        self.error = Some(if message.is_empty() {
            fallback.to_string()
        } else {
            message
        });
        err
    }

    fn clear_credentials(&mut self) {
        self.tokens.remove();
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{AuthResponse, SignupRequest};
    use crate::routes::HistoryNavigator;
    use crate::utils::jwt::{Claims, now_secs};
    use async_trait::async_trait;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::sync::Mutex;

    fn fresh_token() -> String {
        let claims = Claims {
            sub: Some("dana".into()),
            exp: now_secs() + 600,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn dana() -> User {
        User {
            id: 1,
            username: "dana".into(),
            email: "dana@example.com".into(),
            is_active: true,
            created_at: None,
        }
    }

    #[derive(Default)]
    struct FakeAuth {
        reject_sign_in: bool,
        reject_me: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn sign_in(&self, form: &LoginForm) -> Result<AuthResponse, AppError> {
            self.calls.lock().unwrap().push("sign_in");
            if self.reject_sign_in || form.password != "secret1" {
                return Err(AppError::api(401, "Incorrect username or password"));
            }
            Ok(AuthResponse {
                access_token: fresh_token(),
                token_type: "bearer".into(),
            })
        }

        async fn sign_up(&self, _request: &SignupRequest) -> Result<User, AppError> {
            self.calls.lock().unwrap().push("sign_up");
            Ok(dana())
        }

        async fn current_user(&self) -> Result<User, AppError> {
            self.calls.lock().unwrap().push("me");
            if self.reject_me {
                return Err(AppError::api(401, "Could not validate credentials"));
            }
            Ok(dana())
        }
    }

    fn session(api: Arc<FakeAuth>) -> (AuthSession, TokenStore, Arc<HistoryNavigator>) {
        let tokens = TokenStore::memory();
        let nav = Arc::new(HistoryNavigator::new());
        let session = AuthSession::new(api, tokens.clone(), nav.clone());
        (session, tokens, nav)
    }

    #[tokio::test]
    async fn starts_unknown_then_anonymous_without_token() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, _, _) = session(api.clone());
        assert_eq!(auth.status(), AuthStatus::Unknown);
        assert_eq!(auth.restore().await, AuthStatus::Anonymous);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_with_valid_token_loads_user() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, tokens, _) = session(api);
        tokens.save(&fresh_token());
        assert_eq!(auth.restore().await, AuthStatus::Authenticated);
        assert_eq!(auth.user().unwrap().username, "dana");
    }

    #[tokio::test]
    async fn restore_failure_forces_logout() {
        let api = Arc::new(FakeAuth {
            reject_me: true,
            ..Default::default()
        });
        let (mut auth, tokens, _) = session(api);
        tokens.save(&fresh_token());
        assert_eq!(auth.restore().await, AuthStatus::Anonymous);
        assert!(tokens.read().is_none());
    }

    #[tokio::test]
    async fn login_stores_token_and_navigates() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, tokens, nav) = session(api);
        auth.restore().await;

        let user = auth.login(LoginForm::new("dana", "secret1")).await.unwrap();
        assert_eq!(user.id, 1);
        assert!(tokens.is_valid());
        assert_eq!(nav.current(), Some(Route::Dashboard));
        assert_eq!(auth.status(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn login_failure_surfaces_message() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, tokens, nav) = session(api);
        auth.restore().await;

        let err = auth.login(LoginForm::new("dana", "wrong")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(auth.error(), Some("Incorrect username or password"));
        assert_eq!(auth.status(), AuthStatus::Anonymous);
        assert!(tokens.read().is_none());
        assert!(nav.current().is_none());

        auth.clear_error();
        assert!(auth.error().is_none());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_network() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, _, _) = session(api.clone());
        let err = auth.login(LoginForm::new("", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signup_logs_in_with_same_credentials() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, _, nav) = session(api.clone());
        let form = SignupForm {
            username: "dana".into(),
            email: "dana@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        auth.signup(form).await.unwrap();
        assert_eq!(*api.calls.lock().unwrap(), vec!["sign_up", "sign_in", "me"]);
        assert_eq!(nav.current(), Some(Route::Dashboard));
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let api = Arc::new(FakeAuth::default());
        let (mut auth, tokens, nav) = session(api);
        auth.login(LoginForm::new("dana", "secret1")).await.unwrap();

        auth.logout();
        auth.logout();
        assert!(tokens.read().is_none());
        assert_eq!(auth.status(), AuthStatus::Anonymous);
        assert_eq!(nav.current(), Some(Route::Home));
    }
}
