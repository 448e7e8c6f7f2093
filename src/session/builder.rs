// src/session/builder.rs

use std::path::Path;

use validator::Validate;

use crate::{
    config::{ACCEPTED_EXTENSIONS, MAX_UPLOAD_BYTES},
    error::AppError,
    models::{
        question::GeneratedQuestion,
        quiz::{KeywordResponse, SaveQuizRequest},
        user::User,
    },
    services::QuizApi,
};

/// Checks a document before it is uploaded for keyword extraction.
pub fn validate_upload(file_name: &str, size: u64) -> Result<(), AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(AppError::field(
                "file",
                format!(
                    "Unsupported file type. Accepted: {}",
                    ACCEPTED_EXTENSIONS.join(", ").to_uppercase()
                ),
            ));
        }
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::field("file", "File is larger than 10MB"));
    }
    Ok(())
}

/// Generated questions being reviewed before the quiz is saved.
#[derive(Debug, Clone, Default)]
pub struct QuizDraft {
    keywords: Vec<String>,
    questions: Vec<GeneratedQuestion>,
    active: usize,
}

impl QuizDraft {
    pub fn from_extraction(response: KeywordResponse) -> Self {
        Self {
            keywords: response.keywords,
            questions: response.questions,
            active: 0,
        }
    }

    /// Reads `path`, uploads it, and builds a draft from the generated questions.
    pub async fn extract(api: &dyn QuizApi, path: &Path) -> Result<Self, AppError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::field("file", "Please select a file to upload"))?;
        let contents = tokio::fs::read(path).await?;
        validate_upload(file_name, contents.len() as u64)?;

        tracing::info!("Extracting keywords from {} ({} bytes)", file_name, contents.len());
        let response = api.extract_keywords(file_name, contents).await?;
        tracing::info!(
            "Extracted {} keywords, {} questions",
            response.keywords.len(),
            response.questions.len()
        );
        Ok(Self::from_extraction(response))
    }

    /// Asks the service for a fresh set of questions from the current keywords.
    pub async fn regenerate(&mut self, api: &dyn QuizApi) -> Result<(), AppError> {
        if self.keywords.is_empty() {
            return Err(AppError::field("keywords", "No keywords to generate questions from"));
        }
        self.questions = api.generate_questions(&self.keywords).await?;
        self.active = 0;
        tracing::info!("Regenerated {} questions", self.questions.len());
        Ok(())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn questions(&self) -> &[GeneratedQuestion] {
        &self.questions
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_question(&self) -> Option<&GeneratedQuestion> {
        self.questions.get(self.active)
    }

    pub fn next(&mut self) {
        if self.active + 1 < self.questions.len() {
            self.active += 1;
        }
    }

    pub fn previous(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// Replaces question `index` with an edited copy.
    pub fn edit_question(&mut self, index: usize, question: GeneratedQuestion) -> Result<(), AppError> {
        let slot = self
            .questions
            .get_mut(index)
            .ok_or_else(|| AppError::Precondition(format!("Question {} does not exist", index + 1)))?;
        *slot = question;
        Ok(())
    }

    /// Checks the title and every question. The first problem found is reported.
    pub fn validate(&self, title: &str) -> Result<(), AppError> {
        if title.trim().is_empty() {
            return Err(AppError::field("quiz_title", "Please enter a quiz title"));
        }
        if self.questions.is_empty() {
            return Err(AppError::field(
                "questions",
                "No questions available. Please extract keywords from a document first.",
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            if let Err(errors) = q.validate() {
                let message = if errors.field_errors().contains_key("question") {
                    format!("Question {} has empty question text", i + 1)
                } else {
                    format!("Question {} needs at least 2 options", i + 1)
                };
                return Err(AppError::field("questions", message));
            }
            if !q.has_valid_answer() {
                return Err(AppError::field(
                    "questions",
                    format!("Question {} has an invalid correct answer", i + 1),
                ));
            }
        }
        Ok(())
    }

    /// Validates, then saves the draft as a new quiz owned by `user`.
    pub async fn save(
        &self,
        api: &dyn QuizApi,
        user: Option<&User>,
        title: &str,
        description: &str,
    ) -> Result<i64, AppError> {
        self.validate(title)?;
        let user = user.ok_or_else(|| {
            AppError::Precondition("User not authenticated. Please log in again.".to_string())
        })?;

        let request = SaveQuizRequest {
            quiz_title: title.trim().to_string(),
            quiz_description: description.trim().to_string(),
            user_id: user.id,
            questions: self.questions.clone(),
        };
        api.save_quiz(&request).await
    }
}
