// src/models/attempt.rs

use serde::{Deserialize, Serialize};

/// Response of the attempt start call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStart {
    pub attempt_id: i64,
    pub started_at: String,
}

/// Authoritative results returned by the submit call.
/// `score` may arrive fractional; see [`AttemptResults::score_percent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResults {
    pub attempt_id: i64,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub time_spent_seconds: u64,
}

impl AttemptResults {
    pub fn score_percent(&self) -> u8 {
        round_score(self.score)
    }

    pub fn incorrect_answers(&self) -> u32 {
        self.total_questions.saturating_sub(self.correct_answers)
    }
}

/// Rounds a service-provided score to an integer percentage in [0, 100].
pub fn round_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

/// One row of a user's attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub attempt_id: i64,
    pub quiz_id: i64,
    #[serde(default)]
    pub quiz_title: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub time_spent_seconds: Option<u64>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Completed,
    InProgress,
}

impl AttemptStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttemptStatus::Completed => "Completed",
            AttemptStatus::InProgress => "In Progress",
        }
    }
}

/// Coarse score grouping used for history badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_percent(score: u8) -> Self {
        if score >= 70 {
            ScoreBand::Good
        } else if score >= 40 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

impl QuizAttempt {
    pub fn status(&self) -> AttemptStatus {
        if self.completed_at.is_some() {
            AttemptStatus::Completed
        } else {
            AttemptStatus::InProgress
        }
    }

    pub fn score_percent(&self) -> Option<u8> {
        self.score.map(round_score)
    }

    pub fn score_band(&self) -> Option<ScoreBand> {
        self.score_percent().map(ScoreBand::from_percent)
    }
}

/// An option as shown in attempt detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// The service's verdict on one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question_id: i64,
    pub question_text: String,
    pub selected_option_id: Option<i64>,
    pub selected_option_letter: Option<String>,
    pub correct_option_letter: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// Full attempt detail: the history row plus per-question answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    #[serde(default)]
    pub answers: Vec<QuestionAnswer>,
}

impl AttemptDetail {
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}
