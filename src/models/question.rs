// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One option of a saved question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub text: String,
    /// Exactly one option per question is flagged; enforced by the quiz service.
    pub is_correct: bool,
}

/// A saved question as served by the quiz read service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Position of the option flagged correct, if any.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o.is_correct)
    }
}

/// Letter code for a zero-based option position: 0 -> "A", 1 -> "B", ...
pub fn option_letter(index: usize) -> String {
    let offset = u8::try_from(index % 26).unwrap_or(0);
    char::from(b'A' + offset).to_string()
}

/// A question produced by the generator, before it is saved.
/// `correct_answer` holds the text of the correct option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GeneratedQuestion {
    #[validate(custom(function = validate_question_text))]
    pub question: String,
    #[validate(length(min = 2, message = "needs at least 2 options"))]
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl GeneratedQuestion {
    /// True when `correct_answer` is one of the options.
    pub fn has_valid_answer(&self) -> bool {
        !self.correct_answer.is_empty() && self.options.contains(&self.correct_answer)
    }

    /// Replaces option `index`, carrying the correct answer along if it pointed at that option.
    pub fn rename_option(&mut self, index: usize, text: impl Into<String>) {
        let text = text.into();
        if let Some(slot) = self.options.get_mut(index) {
            if *slot == self.correct_answer {
                self.correct_answer = text.clone();
            }
            *slot = text;
        }
    }
}

fn validate_question_text(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_question_text"));
    }
    Ok(())
}
