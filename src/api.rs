// src/api.rs

use reqwest::{Client, Method, StatusCode, header, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::{error::AppError, token::TokenStore};

const DEFAULT_ERROR: &str = "An error occurred";
const DEFAULT_UPLOAD_ERROR: &str = "An error occurred during file upload";

/// A JSON request against the remote API.
///
/// * `path` is appended to the configured base URL.
/// * Query pairs are percent-encoded by `url`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, AppError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Thin HTTP client for the Kwizify API.
///
/// Attaches the bearer token when asked to and a valid one is stored,
/// and shapes every failure into `AppError::Api`. No retries, no timeout.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: Url, tokens: TokenStore) -> Self {
        Self {
            http: Client::new(),
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a JSON request and decodes the response body into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
        include_auth: bool,
    ) -> Result<T, AppError> {
        let url = self.url_for(&req.path, &req.query)?;
        tracing::debug!("Fetching {} {}", req.method, url);

        let mut builder = self
            .http
            .request(req.method.clone(), url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.bearer(include_auth) {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(network_error)?;
        Self::decode(response, DEFAULT_ERROR).await
    }

    /// Posts a multipart form and decodes the response body into `T`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        include_auth: bool,
    ) -> Result<T, AppError> {
        let url = self.url_for(path, &[])?;
        tracing::debug!("Uploading to {}", url);

        let mut builder = self.http.post(url).multipart(form);
        if let Some(token) = self.bearer(include_auth) {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(network_error)?;
        Self::decode(response, DEFAULT_UPLOAD_ERROR).await
    }

    fn bearer(&self, include_auth: bool) -> Option<String> {
        if include_auth && self.tokens.is_valid() {
            self.tokens.read()
        } else {
            None
        }
    }

    fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        {
            // Appended to the base path so a prefix like `/kwizify` survives
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Internal(format!("API base URL '{}' cannot take a path", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if path.ends_with('/') {
                segments.push("");
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, AppError> {
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        tracing::debug!("Response status: {}", status);

        let data = parse_body(&text);

        if !status.is_success() {
            let message = error_message(status, &data, fallback);
            tracing::error!("API error {}: {}", status.as_u16(), message);
            return Err(AppError::api(status.as_u16(), message));
        }

        serde_json::from_value(data).map_err(|e| {
            tracing::error!("Unexpected response shape: {}", e);
            AppError::api(500, format!("Unexpected response: {}", e))
        })
    }
}

/// Empty bodies become `{}`; bodies that are not JSON become `{"detail": text}`.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "detail": text }))
}

/// Picks the user-facing message of a failed response:
/// `detail` (stringified when not a string), then `message`,
/// then the status reason, then `fallback`.
pub fn error_message(status: StatusCode, data: &Value, fallback: &str) -> String {
    match data.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
        Some(detail) if is_present(detail) => return detail.to_string(),
        _ => {}
    }
    if let Some(message) = data.get("message").filter(|m| is_present(m)) {
        return match message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn network_error(err: reqwest::Error) -> AppError {
    tracing::error!("API error: {}", err);
    AppError::api(500, err.to_string())
}
