// src/config.rs

use std::env;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://kwizify-api.onrender.com";

/// Largest document the keyword extractor accepts (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions accepted for keyword extraction.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "doc", "docx"];

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    /// `None` when no storage location is available; the token store then no-ops.
    pub token_path: Option<PathBuf>,
    pub rust_log: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_url = match env::var("KWIZIFY_API_URL") {
            Ok(raw) => Url::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!("Invalid KWIZIFY_API_URL '{}': {}, using default", raw, e);
                default_api_url()
            }),
            Err(_) => default_api_url(),
        };

        let token_path = env::var("KWIZIFY_TOKEN_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".kwizify").join("token"))
            });

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("KWIZIFY_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_log_dir(token_path.as_deref()));

        Self {
            api_url,
            token_path,
            rust_log,
            log_dir,
        }
    }

    /// Config pointing at an explicit API base, with no persisted token.
    pub fn for_api(api_url: Url) -> Self {
        Self {
            api_url,
            token_path: None,
            rust_log: "error".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Logs sit next to the token file (`~/.kwizify/logs`), or in `./logs` without one.
fn default_log_dir(token_path: Option<&Path>) -> PathBuf {
    token_path
        .and_then(Path::parent)
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}
