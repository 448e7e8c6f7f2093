// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims the client cares about.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the username the token was issued to.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: u64,
}

/// Decodes the claims of a token without checking its signature.
///
/// The signing secret lives on the server; the client only reads `exp` and `sub`.
/// Expiry is not checked here, see [`is_expired`].
pub fn decode_claims(token: &str) -> Result<Claims, AppError> {
    let header = decode_header(token).map_err(|_| AppError::AuthExpired)?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| AppError::AuthExpired)?;

    Ok(token_data.claims)
}

/// True when `exp` is at or before the current time.
pub fn is_expired(claims: &Claims) -> bool {
    claims.exp <= now_secs()
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
