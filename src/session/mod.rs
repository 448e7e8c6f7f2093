// src/session/mod.rs

pub mod auth;
pub mod builder;
pub mod difficulty;
pub mod history;
pub mod quiz;
pub mod timer;
