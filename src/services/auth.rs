// src/services/auth.rs

use async_trait::async_trait;

use crate::{
    api::{ApiClient, ApiRequest},
    error::AppError,
    models::user::{AuthResponse, LoginForm, SignupRequest, User},
};

/// Remote auth service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/signin`. Does not touch the token store.
    async fn sign_in(&self, credentials: &LoginForm) -> Result<AuthResponse, AppError>;

    /// `POST /auth/signup`.
    async fn sign_up(&self, request: &SignupRequest) -> Result<User, AppError>;

    /// `GET /auth/me` with the stored bearer token.
    async fn current_user(&self) -> Result<User, AppError>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn sign_in(&self, credentials: &LoginForm) -> Result<AuthResponse, AppError> {
        let req = ApiRequest::post("/auth/signin").json(credentials)?;
        self.request(req, false).await
    }

    async fn sign_up(&self, request: &SignupRequest) -> Result<User, AppError> {
        let req = ApiRequest::post("/auth/signup").json(request)?;
        self.request(req, false).await
    }

    async fn current_user(&self) -> Result<User, AppError> {
        self.request(ApiRequest::get("/auth/me"), true).await
    }
}
