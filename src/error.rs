// src/error.rs

use std::collections::BTreeMap;
use std::fmt;

use validator::ValidationErrors;

/// Field name -> first user-facing message for that field.
pub type FieldErrors = BTreeMap<String, String>;

/// Global Application Error Enum.
/// Every failure a view can display goes through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // Local form checks, resolved before any request is sent
    Validation(FieldErrors),

    // Non-2xx response or network failure from the remote API
    Api { status: u16, message: String },

    // Stored token missing or past its expiry
    AuthExpired,

    // Operation preconditions not met (no user, empty quiz, ...)
    Precondition(String),

    // Session asked to do something its current phase does not allow
    InvalidTransition { from: String, action: String },

    // Local I/O or serialization failures
    Internal(String),
}

impl AppError {
    /// Shorthand for building an `Api` error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        AppError::Api {
            status,
            message: message.into(),
        }
    }

    /// Builds a single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.into());
        AppError::Validation(errors)
    }

    /// The text a view shows to the user, verbatim.
    pub fn message(&self) -> String {
        match self {
            AppError::Validation(fields) => fields
                .values()
                .cloned()
                .collect::<Vec<_>>()
                .join("; "),
            AppError::Api { message, .. } => message.clone(),
            AppError::AuthExpired => "Your session has expired. Please log in again.".to_string(),
            AppError::Precondition(msg) => msg.clone(),
            AppError::InvalidTransition { from, action } => {
                format!("Cannot {} while {}", action, from)
            }
            AppError::Internal(msg) => msg.clone(),
        }
    }

    /// HTTP status carried by an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api { status, message } => write!(f, "[{}] {}", status, message),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `validator::ValidationErrors` into field-scoped messages.
/// Keeps the first error per field; falls back to the error code when no message is set.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                errs.first().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    (field.to_string(), message)
                })
            })
            .collect();
        AppError::Validation(fields)
    }
}

/// Network-level failures are normalized to status 500.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(500);
        AppError::api(status, err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
