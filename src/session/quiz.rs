// src/session/quiz.rs

use std::fmt;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptResults, AttemptStart, round_score},
        question::{Question, option_letter},
        quiz::Quiz,
        user::User,
    },
    services::AttemptApi,
    session::{
        difficulty::{self, Difficulty},
        timer::ElapsedTimer,
    },
    utils::time::format_clock,
};

/// Lifecycle of one attempt.
///
/// `Idle -> Starting -> InProgress -> AwaitingConfirmation -> Submitting -> Finished`,
/// with `Failed` reachable from `Starting` and `Submitting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    InProgress,
    AwaitingConfirmation,
    Submitting,
    Finished,
    Failed(String),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::InProgress => "in progress",
            Phase::AwaitingConfirmation => "awaiting confirmation",
            Phase::Submitting => "submitting",
            Phase::Finished => "finished",
            Phase::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The answer recorded for one question position.
/// `letter` is empty until an option is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub option_id: Option<i64>,
    pub letter: String,
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        !self.letter.is_empty()
    }
}

/// How an option of the current question should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    /// Revealed as the correct option.
    Correct,
    /// Selected, revealed as wrong.
    Wrong,
    /// Revealed, neither correct nor selected.
    Dimmed,
}

/// Shown while waiting for the user to confirm finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishSummary {
    pub answered: usize,
    pub total: usize,
    pub elapsed_seconds: u64,
}

/// Client-side state of one quiz attempt.
///
/// Owns the attempt's timer; the timer is stopped on every terminal
/// transition, and aborted with the session when it is dropped.
pub struct QuizSession {
    quiz: Arc<Quiz>,
    api: Arc<dyn AttemptApi>,
    phase: Phase,
    user_id: Option<i64>,
    attempt: Option<AttemptStart>,
    index: usize,
    answers: Vec<Answer>,
    /// Questions whose answer has been submitted at least once.
    revealed: Vec<bool>,
    selected: Option<i64>,
    submitted: bool,
    difficulties: Vec<Difficulty>,
    timer: ElapsedTimer,
    results: Option<AttemptResults>,
}

impl QuizSession {
    pub fn new(quiz: Arc<Quiz>, api: Arc<dyn AttemptApi>) -> Self {
        Self {
            quiz,
            api,
            phase: Phase::Idle,
            user_id: None,
            attempt: None,
            index: 0,
            answers: Vec::new(),
            revealed: Vec::new(),
            selected: None,
            submitted: false,
            difficulties: Vec::new(),
            timer: ElapsedTimer::new(),
            results: None,
        }
    }

    /// Opens a new attempt for `user`. Allowed from `Idle` and `Finished`.
    pub async fn start(&mut self, user: Option<&User>) -> Result<(), AppError> {
        match self.phase {
            Phase::Idle | Phase::Finished => {}
            _ => return Err(self.invalid("start the quiz")),
        }
        self.begin(user.map(|u| u.id)).await
    }

    /// Discards the finished attempt and starts a new one for the same user.
    pub async fn restart(&mut self) -> Result<(), AppError> {
        if self.phase != Phase::Finished {
            return Err(self.invalid("restart the quiz"));
        }
        tracing::info!("Restarting quiz {}", self.quiz.id);
        self.begin(self.user_id).await
    }

    async fn begin(&mut self, user_id: Option<i64>) -> Result<(), AppError> {
        self.reset();
        self.phase = Phase::Starting;

        let Some(user_id) = user_id else {
            return Err(self.fail(AppError::Precondition(
                "You must be logged in to take a quiz.".to_string(),
            )));
        };
        self.user_id = Some(user_id);

        let count = self.quiz.questions.len();
        if count == 0 {
            return Err(self.fail(AppError::Precondition(
                "This quiz doesn't have any questions.".to_string(),
            )));
        }

        let started = self.api.start_attempt(self.quiz.id, user_id).await;
        let attempt = match started {
            Ok(attempt) => attempt,
            Err(e) => {
                tracing::error!("Failed to start attempt for quiz {}: {}", self.quiz.id, e);
                return Err(self.fail(e));
            }
        };

        tracing::info!(
            "Attempt {} started for quiz {} at {}",
            attempt.attempt_id,
            self.quiz.id,
            attempt.started_at
        );
        self.answers = vec![Answer::default(); count];
        self.revealed = vec![false; count];
        self.difficulties = difficulty::assign(attempt.attempt_id as u64, count);
        self.attempt = Some(attempt);
        self.timer.start();
        self.phase = Phase::InProgress;
        Ok(())
    }

    /// Selects option `option_index` of the current question.
    /// Ignored once the current question's answer has been submitted.
    pub fn select_option(&mut self, option_index: usize) -> Result<(), AppError> {
        self.require_in_progress("select an option")?;
        if self.submitted {
            return Ok(());
        }
        let option_id = {
            let question = self.current_question().ok_or_else(|| self.invalid("select an option"))?;
            let option = question.options.get(option_index).ok_or_else(|| {
                AppError::Precondition(format!(
                    "Question {} has no option {}",
                    self.index + 1,
                    option_letter(option_index)
                ))
            })?;
            option.id
        };

        self.selected = Some(option_id);
        self.answers[self.index] = Answer {
            option_id: Some(option_id),
            letter: option_letter(option_index),
        };
        Ok(())
    }

    /// Freezes the current selection and reveals correctness. Does not advance.
    pub fn submit_answer(&mut self) -> Result<(), AppError> {
        self.require_in_progress("submit an answer")?;
        if self.submitted {
            return Ok(());
        }
        if self.selected.is_none() {
            return Err(AppError::Precondition(
                "Select an option before submitting.".to_string(),
            ));
        }
        self.submitted = true;
        self.revealed[self.index] = true;
        Ok(())
    }

    /// Moves to the next question after the current answer was submitted.
    pub fn next(&mut self) -> Result<(), AppError> {
        self.require_in_progress("go to the next question")?;
        if !self.submitted || self.is_last_question() {
            return Err(self.invalid("go to the next question"));
        }
        self.move_to(self.index + 1);
        Ok(())
    }

    /// Moves forward without submitting the current question.
    pub fn skip(&mut self) -> Result<(), AppError> {
        self.require_in_progress("skip the question")?;
        if self.submitted || self.is_last_question() {
            return Err(self.invalid("skip the question"));
        }
        self.move_to(self.index + 1);
        Ok(())
    }

    /// Moves back one question while the current one is not submitted.
    pub fn previous(&mut self) -> Result<(), AppError> {
        self.require_in_progress("go to the previous question")?;
        if self.submitted || self.index == 0 {
            return Err(self.invalid("go to the previous question"));
        }
        self.move_to(self.index - 1);
        Ok(())
    }

    /// True on the last question once its answer has been submitted.
    pub fn can_finish(&self) -> bool {
        self.phase == Phase::InProgress && self.is_last_question() && self.submitted
    }

    /// Asks for confirmation before submitting the attempt. Mutates nothing else.
    pub fn request_finish(&mut self) -> Result<FinishSummary, AppError> {
        if !self.can_finish() {
            return Err(self.invalid("finish the quiz"));
        }
        self.phase = Phase::AwaitingConfirmation;
        Ok(FinishSummary {
            answered: self.answered_count(),
            total: self.question_count(),
            elapsed_seconds: self.elapsed_seconds(),
        })
    }

    pub fn cancel_finish(&mut self) -> Result<(), AppError> {
        if self.phase != Phase::AwaitingConfirmation {
            return Err(self.invalid("cancel finishing"));
        }
        self.phase = Phase::InProgress;
        Ok(())
    }

    /// Stops the timer and submits every letter answer with the elapsed time.
    /// The returned results are the service's; nothing is scored locally.
    pub async fn confirm_finish(&mut self) -> Result<&AttemptResults, AppError> {
        if self.phase != Phase::AwaitingConfirmation {
            return Err(self.invalid("submit the quiz"));
        }
        self.phase = Phase::Submitting;
        let elapsed = self.timer.stop();

        let Some(user_id) = self.user_id else {
            return Err(self.fail(AppError::Precondition(
                "You must be logged in to submit a quiz.".to_string(),
            )));
        };
        let letters = self.letters();

        let submitted = self
            .api
            .submit_attempt(self.quiz.id, user_id, elapsed, &letters)
            .await;
        match submitted {
            Ok(results) => {
                tracing::info!(
                    "Attempt {} finished: {}/{} correct in {}s",
                    results.attempt_id,
                    results.correct_answers,
                    results.total_questions,
                    results.time_spent_seconds
                );
                self.phase = Phase::Finished;
                Ok(&*self.results.insert(results))
            }
            Err(e) => {
                tracing::error!("Failed to submit attempt for quiz {}: {}", self.quiz.id, e);
                Err(self.fail(e))
            }
        }
    }

    /// Stops the timer when the view goes away mid-attempt.
    pub fn close(&mut self) {
        self.timer.stop();
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn attempt_id(&self) -> Option<i64> {
        self.attempt.as_ref().map(|a| a.attempt_id)
    }

    pub fn started_at(&self) -> Option<&str> {
        self.attempt.as_ref().map(|a| a.started_at.as_str())
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.answers.is_empty() {
            return None;
        }
        self.quiz.questions.get(self.index)
    }

    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.question_count()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Option id highlighted on the current question.
    pub fn selected_option(&self) -> Option<i64> {
        self.selected
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Ordered letter answers, `""` for unanswered positions.
    pub fn letters(&self) -> Vec<String> {
        self.answers.iter().map(|a| a.letter.clone()).collect()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.answered_count(), self.answers.len())
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.seconds()
    }

    pub fn elapsed_display(&self) -> String {
        format_clock(self.elapsed_seconds())
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn difficulty(&self, index: usize) -> Option<Difficulty> {
        self.difficulties.get(index).copied()
    }

    pub fn difficulties(&self) -> &[Difficulty] {
        &self.difficulties
    }

    /// Display marks for each option of the current question.
    pub fn option_marks(&self) -> Vec<OptionMark> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        question
            .options
            .iter()
            .map(|option| {
                let selected = self.selected == Some(option.id);
                match (self.submitted, option.is_correct, selected) {
                    (true, true, _) => OptionMark::Correct,
                    (true, false, true) => OptionMark::Wrong,
                    (true, false, false) => OptionMark::Dimmed,
                    (false, _, true) => OptionMark::Selected,
                    (false, _, false) => OptionMark::Neutral,
                }
            })
            .collect()
    }

    /// Running percentage of submitted answers that hit the flagged option.
    /// Feedback only; never the attempt's score.
    pub fn provisional_score(&self) -> u8 {
        let mut revealed = 0usize;
        let mut correct = 0usize;
        for ((question, answer), shown) in self
            .quiz
            .questions
            .iter()
            .zip(&self.answers)
            .zip(&self.revealed)
        {
            if !*shown || answer.option_id.is_none() {
                continue;
            }
            revealed += 1;
            let hit = question
                .options
                .iter()
                .any(|o| o.is_correct && Some(o.id) == answer.option_id);
            if hit {
                correct += 1;
            }
        }
        if revealed == 0 {
            return 0;
        }
        round_score(correct as f64 / revealed as f64 * 100.0)
    }

    /// Authoritative results, once finished.
    pub fn results(&self) -> Option<&AttemptResults> {
        self.results.as_ref()
    }

    fn move_to(&mut self, index: usize) {
        self.index = index;
        self.submitted = self.revealed[index];
        self.selected = self.answers[index].option_id;
    }

    fn reset(&mut self) {
        self.timer = ElapsedTimer::new();
        self.attempt = None;
        self.index = 0;
        self.answers.clear();
        self.revealed.clear();
        self.selected = None;
        self.submitted = false;
        self.difficulties.clear();
        self.results = None;
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.timer.stop();
        self.phase = Phase::Failed(err.message());
        err
    }

    fn require_in_progress(&self, action: &str) -> Result<(), AppError> {
        if self.phase == Phase::InProgress {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> AppError {
        AppError::InvalidTransition {
            from: self.phase.name().to_string(),
            action: action.to_string(),
        }
    }
}
