// src/services/mod.rs

pub mod attempt;
pub mod auth;
pub mod quiz;

pub use attempt::AttemptApi;
pub use auth::AuthApi;
pub use quiz::QuizApi;
