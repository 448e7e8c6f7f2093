// src/session/history.rs

use crate::{
    models::{attempt::QuizAttempt, quiz::Quiz, user::User},
    services::{AttemptApi, QuizApi},
};

/// Result of a background fetch as a view sees it.
/// Failures degrade to a message instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Loaded(Vec<T>),
    Empty(String),
    Unavailable(String),
}

impl<T> Listing<T> {
    fn from_items(items: Vec<T>, empty_message: &str) -> Self {
        if items.is_empty() {
            Listing::Empty(empty_message.to_string())
        } else {
            Listing::Loaded(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Listing::Loaded(_) => None,
            Listing::Empty(msg) | Listing::Unavailable(msg) => Some(msg),
        }
    }
}

/// Loads the user's attempts, optionally only those for `quiz_id`.
pub async fn load_history(
    api: &dyn AttemptApi,
    user: Option<&User>,
    quiz_id: Option<i64>,
) -> Listing<QuizAttempt> {
    let Some(user) = user else {
        return Listing::Unavailable("User not authenticated".to_string());
    };

    match api.user_attempts(user.id).await {
        Ok(attempts) => {
            let attempts = attempts
                .into_iter()
                .filter(|a| quiz_id.is_none_or(|id| a.quiz_id == id))
                .collect();
            Listing::from_items(attempts, "You haven't taken any quizzes yet.")
        }
        Err(e) => {
            tracing::warn!("Failed to load attempts for user {}: {}", user.id, e);
            Listing::Unavailable(format!("Failed to load quiz attempts: {}", e.message()))
        }
    }
}

/// Loads the quizzes created by the user.
pub async fn load_quizzes(api: &dyn QuizApi, user: Option<&User>) -> Listing<Quiz> {
    let Some(user) = user else {
        return Listing::Unavailable("User not authenticated".to_string());
    };

    match api.user_quizzes(user.id).await {
        Ok(quizzes) => Listing::from_items(quizzes, "You haven't created any quizzes yet."),
        Err(e) => {
            tracing::warn!("Failed to load quizzes for user {}: {}", user.id, e);
            Listing::Unavailable(format!("Failed to load quizzes: {}", e.message()))
        }
    }
}
