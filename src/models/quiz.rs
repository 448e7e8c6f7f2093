// src/models/quiz.rs

use serde::{Deserialize, Serialize};

use super::question::{GeneratedQuestion, Question};

/// A quiz as returned by the quiz read service.
/// Listing endpoints omit `questions` and may send `question_count` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub question_count: Option<usize>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn total_questions(&self) -> usize {
        if self.questions.is_empty() {
            self.question_count.unwrap_or(0)
        } else {
            self.questions.len()
        }
    }

    /// Two minutes per question.
    pub fn estimated_minutes(&self) -> usize {
        self.total_questions() * 2
    }
}

/// Response of the keyword extraction upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordResponse {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}

/// Everything needed to save a generated quiz.
#[derive(Debug, Clone, Serialize)]
pub struct SaveQuizRequest {
    pub quiz_title: String,
    pub quiz_description: String,
    pub user_id: i64,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedQuiz {
    pub quiz_id: i64,
}
