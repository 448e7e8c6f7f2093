// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod token;
pub mod utils;

// Re-export specific items for convenience
pub use api::ApiClient;
pub use error::AppError;
pub use session::quiz::QuizSession;
