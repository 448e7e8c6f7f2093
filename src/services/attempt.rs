// src/services/attempt.rs

use async_trait::async_trait;

use crate::{
    api::{ApiClient, ApiRequest},
    error::AppError,
    models::attempt::{AttemptDetail, AttemptResults, AttemptStart, QuizAttempt},
};

/// Remote attempt service. Scores are computed there, never locally.
#[async_trait]
pub trait AttemptApi: Send + Sync {
    async fn start_attempt(&self, quiz_id: i64, user_id: i64) -> Result<AttemptStart, AppError>;

    /// Sends the ordered letter answers (one entry per question, `""` when unanswered).
    async fn submit_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        time_spent_seconds: u64,
        letters: &[String],
    ) -> Result<AttemptResults, AppError>;

    async fn user_attempts(&self, user_id: i64) -> Result<Vec<QuizAttempt>, AppError>;

    async fn attempt_detail(&self, attempt_id: i64) -> Result<AttemptDetail, AppError>;
}

#[async_trait]
impl AttemptApi for ApiClient {
    async fn start_attempt(&self, quiz_id: i64, user_id: i64) -> Result<AttemptStart, AppError> {
        let req = ApiRequest::post("/api/quiz/quiz-attempts/start")
            .query("quiz_id", quiz_id)
            .query("user_id", user_id);
        self.request(req, true).await
    }

    async fn submit_attempt(
        &self,
        quiz_id: i64,
        user_id: i64,
        time_spent_seconds: u64,
        letters: &[String],
    ) -> Result<AttemptResults, AppError> {
        let req = ApiRequest::post("/api/quiz/quiz-attempts/submit")
            .query("quiz_id", quiz_id)
            .query("user_id", user_id)
            .query("time_spent_seconds", time_spent_seconds)
            .json(letters)?;
        let results: AttemptResults = self.request(req, true).await?;
        tracing::info!(
            "Quiz {} submitted: attempt {}, score {}",
            quiz_id,
            results.attempt_id,
            results.score_percent()
        );
        Ok(results)
    }

    async fn user_attempts(&self, user_id: i64) -> Result<Vec<QuizAttempt>, AppError> {
        let req = ApiRequest::get(format!("/api/quiz/quiz-attempts/user/{}", user_id));
        self.request(req, true).await
    }

    async fn attempt_detail(&self, attempt_id: i64) -> Result<AttemptDetail, AppError> {
        let req = ApiRequest::get(format!("/api/quiz/quiz-attempts/{}", attempt_id));
        self.request(req, true).await
    }
}
