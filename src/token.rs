// src/token.rs

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::utils::jwt::{decode_claims, is_expired};

/// Where the bearer token lives.
#[derive(Debug, Clone)]
enum Backend {
    /// One file holding the raw token string.
    File(PathBuf),
    /// Process-local slot; shared between clones.
    Memory(Arc<Mutex<Option<String>>>),
    /// No storage available. Every operation is a no-op.
    Disabled,
}

/// Persists the single auth token used by the API client.
///
/// None of the operations fail: storage problems are logged and the
/// token is treated as absent.
#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: Backend,
}

impl TokenStore {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(Mutex::new(None))),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
        }
    }

    /// File store at `path`, or a disabled store when there is nowhere to write.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::file(path),
            None => Self::disabled(),
        }
    }

    pub fn save(&self, token: &str) {
        match &self.backend {
            Backend::File(path) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        tracing::warn!("Failed to create token directory {:?}: {}", parent, e);
                        return;
                    }
                }
                if let Err(e) = fs::write(path, token) {
                    tracing::warn!("Failed to write token to {:?}: {}", path, e);
                }
            }
            Backend::Memory(slot) => {
                if let Ok(mut slot) = slot.lock() {
                    *slot = Some(token.to_string());
                }
            }
            Backend::Disabled => {}
        }
    }

    pub fn read(&self) -> Option<String> {
        let raw = match &self.backend {
            Backend::File(path) => fs::read_to_string(path).ok()?,
            Backend::Memory(slot) => slot.lock().ok()?.clone()?,
            Backend::Disabled => return None,
        };
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    pub fn remove(&self) {
        match &self.backend {
            Backend::File(path) => {
                if path.exists() {
                    if let Err(e) = fs::remove_file(path) {
                        tracing::warn!("Failed to remove token file {:?}: {}", path, e);
                    }
                }
            }
            Backend::Memory(slot) => {
                if let Ok(mut slot) = slot.lock() {
                    *slot = None;
                }
            }
            Backend::Disabled => {}
        }
    }

    /// True when a token is stored, decodes, and its `exp` is in the future.
    pub fn is_valid(&self) -> bool {
        let Some(token) = self.read() else {
            return false;
        };
        match decode_claims(&token) {
            Ok(claims) => !is_expired(&claims),
            Err(_) => {
                tracing::debug!("Stored token could not be decoded");
                false
            }
        }
    }

    /// The `sub` claim of the stored token.
    pub fn username(&self) -> Option<String> {
        let token = self.read()?;
        decode_claims(&token).ok()?.sub
    }
}
