// src/services/quiz.rs

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::{
    api::{ApiClient, ApiRequest},
    error::AppError,
    models::{
        question::GeneratedQuestion,
        quiz::{KeywordResponse, Quiz, SaveQuizRequest, SavedQuiz},
    },
};

/// Remote keyword extraction, question generation, and quiz read service.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Uploads a document; the service extracts keywords and drafts questions.
    async fn extract_keywords(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<KeywordResponse, AppError>;

    async fn generate_questions(
        &self,
        keywords: &[String],
    ) -> Result<Vec<GeneratedQuestion>, AppError>;

    /// Returns the id of the new quiz.
    async fn save_quiz(&self, request: &SaveQuizRequest) -> Result<i64, AppError>;

    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError>;

    async fn user_quizzes(&self, user_id: i64) -> Result<Vec<Quiz>, AppError>;
}

#[async_trait]
impl QuizApi for ApiClient {
    async fn extract_keywords(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<KeywordResponse, AppError> {
        let part = Part::bytes(contents).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        self.upload("/api/keywords/extract-keywords/", form, true)
            .await
    }

    async fn generate_questions(
        &self,
        keywords: &[String],
    ) -> Result<Vec<GeneratedQuestion>, AppError> {
        let form = keywords
            .iter()
            .fold(Form::new(), |form, k| form.text("keywords", k.clone()));
        self.upload("/api/questions/generate-questions/", form, true)
            .await
    }

    async fn save_quiz(&self, request: &SaveQuizRequest) -> Result<i64, AppError> {
        let req = ApiRequest::post("/api/keywords/save-quiz/")
            .query("quiz_title", &request.quiz_title)
            .query("quiz_description", &request.quiz_description)
            .query("user_id", request.user_id)
            .json(&request.questions)?;
        let saved: SavedQuiz = self.request(req, true).await?;
        tracing::info!("Quiz '{}' saved with id {}", request.quiz_title, saved.quiz_id);
        Ok(saved.quiz_id)
    }

    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, AppError> {
        let req = ApiRequest::get(format!("/api/questions/quiz/{}", quiz_id));
        self.request(req, true).await
    }

    async fn user_quizzes(&self, user_id: i64) -> Result<Vec<Quiz>, AppError> {
        let req = ApiRequest::get(format!("/api/questions/user/{}/quizzes", user_id));
        self.request(req, true).await
    }
}
