// src/cli.rs

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptDetail, QuizAttempt, ScoreBand},
        question::option_letter,
        quiz::Quiz,
        user::{LoginForm, SignupForm, User},
    },
    routes::{Navigator, Route},
    services::{AttemptApi, QuizApi},
    session::{
        auth::AuthSession,
        builder::QuizDraft,
        history::{Listing, load_history, load_quizzes},
        quiz::{OptionMark, Phase, QuizSession},
    },
    state::AppState,
    utils::time::{format_clock, format_duration, format_timestamp},
};

#[derive(Parser, Debug)]
#[command(name = "kwizify")]
#[command(about = "Generate quizzes from your documents and take them from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the access token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account, then sign in
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List your quizzes
    #[command(alias = "ls")]
    Quizzes,

    /// Show a quiz's details
    Quiz { id: i64 },

    /// Take a quiz interactively
    Play { id: i64 },

    /// List your attempts
    History {
        /// Only attempts for this quiz
        #[arg(long)]
        quiz: Option<i64>,
    },

    /// Show one attempt with per-question results
    Attempt { id: i64 },

    /// Upload a document, then save the generated questions as a quiz
    Create {
        file: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
}

/// Runs one command against the configured API.
pub async fn run(cli: Cli, state: AppState) -> Result<(), AppError> {
    let mut auth = state.auth_session();
    auth.restore().await;
    let mut out = std::io::stdout();

    match cli.command {
        Command::Login { username, password } => {
            let user = auth.login(LoginForm::new(username, password)).await?;
            writeln!(out, "Logged in as {}", user.username)?;
        }
        Command::Signup {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                username,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let user = auth.signup(form).await?;
            writeln!(out, "Welcome, {}! You are now logged in.", user.username)?;
        }
        Command::Logout => {
            auth.logout();
            writeln!(out, "Logged out")?;
        }
        Command::Whoami => match auth.user() {
            Some(user) => writeln!(out, "{} <{}> (id {})", user.username, user.email, user.id)?,
            None => writeln!(out, "Not logged in")?,
        },
        Command::Quizzes => {
            enter(&state, &auth, Route::Quizzes)?;
            let listing = load_quizzes(state.quiz_api().as_ref(), auth.user()).await;
            print_quizzes(&mut out, &listing)?;
        }
        Command::Quiz { id } => {
            enter(&state, &auth, Route::Quiz(id))?;
            let quiz = state.quiz_api().get_quiz(id).await?;
            writeln!(out, "{}", quiz.title)?;
            if !quiz.description.is_empty() {
                writeln!(out, "{}", quiz.description)?;
            }
            if let Some(created) = &quiz.created_at {
                writeln!(out, "Created {}", format_timestamp(created))?;
            }
            writeln!(out, "{} Questions", quiz.total_questions())?;
            writeln!(out, "Estimated time: {} minutes", quiz.estimated_minutes())?;
        }
        Command::Play { id } => {
            enter(&state, &auth, Route::Quiz(id))?;
            let quiz = state.quiz_api().get_quiz(id).await?;
            let mut session = QuizSession::new(Arc::new(quiz), state.attempt_api());
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            play(&mut session, auth.user(), input, &mut out).await?;
        }
        Command::History { quiz } => {
            enter(&state, &auth, Route::Dashboard)?;
            let listing = load_history(state.attempt_api().as_ref(), auth.user(), quiz).await;
            print_history(&mut out, &listing)?;
        }
        Command::Attempt { id } => {
            if !auth.is_logged_in() {
                state.navigator.navigate(Route::Login);
                return Err(AppError::AuthExpired);
            }
            let detail = state.attempt_api().attempt_detail(id).await?;
            state.navigator.navigate(Route::Attempt {
                quiz_id: detail.attempt.quiz_id,
                attempt_id: id,
            });
            print_attempt(&mut out, &detail)?;
        }
        Command::Create {
            file,
            title,
            description,
        } => {
            enter(&state, &auth, Route::CreateQuiz)?;
            let api = state.quiz_api();
            let draft = QuizDraft::extract(api.as_ref(), &file).await?;
            writeln!(out, "Keywords: {}", draft.keywords().join(", "))?;
            for (i, q) in draft.questions().iter().enumerate() {
                writeln!(out, "{}. {} (answer: {})", i + 1, q.question, q.correct_answer)?;
            }
            let quiz_id = draft
                .save(api.as_ref(), auth.user(), &title, &description)
                .await?;
            state.navigator.navigate(Route::Quiz(quiz_id));
            writeln!(out, "Quiz saved with id {}", quiz_id)?;
        }
    }
    Ok(())
}

/// Applies the auth guard and records the navigation.
fn enter(state: &AppState, auth: &AuthSession, route: Route) -> Result<(), AppError> {
    let landed = route.clone().guard(auth.is_logged_in());
    state.navigator.navigate(landed.clone());
    if landed == route {
        Ok(())
    } else {
        Err(AppError::AuthExpired)
    }
}

/// One line of input during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    Select(usize),
    Submit,
    Next,
    Skip,
    Previous,
    Finish,
    Confirm,
    Cancel,
    Restart,
    Quit,
}

/// Digits pick an option (1-based); single letters are commands.
pub fn parse_play_command(line: &str) -> Option<PlayCommand> {
    let line = line.trim().to_ascii_lowercase();
    if let Ok(n) = line.parse::<usize>() {
        return n.checked_sub(1).map(PlayCommand::Select);
    }
    let command = match line.as_str() {
        "s" | "submit" => PlayCommand::Submit,
        "n" | "next" => PlayCommand::Next,
        "k" | "skip" => PlayCommand::Skip,
        "p" | "prev" | "previous" => PlayCommand::Previous,
        "f" | "finish" => PlayCommand::Finish,
        "y" | "yes" | "confirm" => PlayCommand::Confirm,
        "c" | "cancel" => PlayCommand::Cancel,
        "r" | "restart" => PlayCommand::Restart,
        "q" | "quit" => PlayCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Drives a quiz session from line input until the user quits or input ends.
pub async fn play<R, W>(
    session: &mut QuizSession,
    user: Option<&User>,
    input: R,
    out: &mut W,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.start(user).await?;
    render(session, out)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_play_command(&line) else {
            writeln!(out, "Unknown command '{}'", line.trim())?;
            continue;
        };
        if command == PlayCommand::Quit {
            break;
        }
        if let Err(e) = apply(session, command, out).await {
            if matches!(session.phase(), Phase::Failed(_)) {
                return Err(e);
            }
            writeln!(out, "{}", e.message())?;
        }
        render(session, out)?;
    }

    session.close();
    Ok(())
}

async fn apply<W: Write>(
    session: &mut QuizSession,
    command: PlayCommand,
    out: &mut W,
) -> Result<(), AppError> {
    match command {
        PlayCommand::Select(i) => session.select_option(i),
        PlayCommand::Submit => session.submit_answer(),
        PlayCommand::Next => session.next(),
        PlayCommand::Skip => session.skip(),
        PlayCommand::Previous => session.previous(),
        PlayCommand::Finish => {
            let summary = session.request_finish()?;
            writeln!(
                out,
                "Finish the quiz? You answered {} of {} questions in {}. [y]es / [c]ancel",
                summary.answered,
                summary.total,
                format_clock(summary.elapsed_seconds)
            )?;
            Ok(())
        }
        PlayCommand::Confirm => session.confirm_finish().await.map(|_| ()),
        PlayCommand::Cancel => session.cancel_finish(),
        PlayCommand::Restart => session.restart().await,
        PlayCommand::Quit => Ok(()),
    }
}

fn render<W: Write>(session: &QuizSession, out: &mut W) -> Result<(), AppError> {
    match session.phase() {
        Phase::InProgress => {}
        Phase::Finished => {
            if let Some(results) = session.results() {
                writeln!(out, "Quiz Results: {}%", results.score_percent())?;
                writeln!(
                    out,
                    "You answered {} out of {} questions correctly",
                    results.correct_answers, results.total_questions
                )?;
                writeln!(
                    out,
                    "Correct: {}  Incorrect: {}  Time: {}",
                    results.correct_answers,
                    results.incorrect_answers(),
                    format_clock(results.time_spent_seconds)
                )?;
                writeln!(out, "[r]estart or [q]uit")?;
            }
            return Ok(());
        }
        _ => return Ok(()),
    }

    let Some(question) = session.current_question() else {
        return Ok(());
    };
    let (answered, total) = session.progress();
    let difficulty = session
        .difficulty(session.current_index())
        .map(|d| d.label())
        .unwrap_or("");
    writeln!(
        out,
        "\nQuestion {} of {} [{}]  answered {}/{}  {}  score {}%",
        session.current_index() + 1,
        total,
        difficulty,
        answered,
        total,
        session.elapsed_display(),
        session.provisional_score()
    )?;
    writeln!(out, "{}", question.question_text)?;
    for (i, (option, mark)) in question
        .options
        .iter()
        .zip(session.option_marks())
        .enumerate()
    {
        let marker = match mark {
            OptionMark::Neutral => "[ ]",
            OptionMark::Selected => "[>]",
            OptionMark::Correct => "[+]",
            OptionMark::Wrong => "[x]",
            OptionMark::Dimmed => "[-]",
        };
        writeln!(out, "  {} {}) {}. {}", marker, i + 1, option_letter(i), option.text)?;
    }

    let hint = if !session.is_submitted() {
        "1-9 select, [s]ubmit, s[k]ip, [p]revious, [q]uit"
    } else if session.can_finish() {
        "[f]inish, [q]uit"
    } else {
        "[n]ext, [q]uit"
    };
    writeln!(out, "{}", hint)?;
    Ok(())
}

fn print_quizzes<W: Write>(out: &mut W, listing: &Listing<Quiz>) -> Result<(), AppError> {
    if let Some(message) = listing.message() {
        writeln!(out, "{}", message)?;
        return Ok(());
    }
    for quiz in listing.items() {
        writeln!(
            out,
            "#{:<5} {:<40} {:>3} questions",
            quiz.id,
            quiz.title,
            quiz.total_questions()
        )?;
    }
    Ok(())
}

fn print_history<W: Write>(out: &mut W, listing: &Listing<QuizAttempt>) -> Result<(), AppError> {
    if let Some(message) = listing.message() {
        writeln!(out, "{}", message)?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<8} {:<30} {:<17} {:>8} {:>10}  Status",
        "Attempt", "Quiz", "Date", "Score", "Time"
    )?;
    for attempt in listing.items() {
        let score = match (attempt.score_percent(), attempt.score_band()) {
            (Some(s), Some(band)) => format!("{}% {}", s, band_mark(band)),
            _ => "-".to_string(),
        };
        writeln!(
            out,
            "{:<8} {:<30} {:<17} {:>8} {:>10}  {}",
            attempt.attempt_id,
            attempt.quiz_title,
            format_timestamp(&attempt.started_at),
            score,
            format_duration(attempt.time_spent_seconds),
            attempt.status().label()
        )?;
    }
    Ok(())
}

fn band_mark(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "+",
        ScoreBand::Fair => "~",
        ScoreBand::Poor => "-",
    }
}

fn print_attempt<W: Write>(out: &mut W, detail: &AttemptDetail) -> Result<(), AppError> {
    let attempt = &detail.attempt;
    writeln!(out, "{} (attempt {})", attempt.quiz_title, attempt.attempt_id)?;
    writeln!(
        out,
        "Score: {}  Time: {}  Status: {}",
        attempt
            .score_percent()
            .map(|s| format!("{}%", s))
            .unwrap_or_else(|| "-".to_string()),
        format_duration(attempt.time_spent_seconds),
        attempt.status().label()
    )?;
    writeln!(out, "Correct: {}/{}", detail.correct_count(), detail.answers.len())?;
    for (i, answer) in detail.answers.iter().enumerate() {
        let verdict = if answer.is_correct { "correct" } else { "wrong" };
        writeln!(
            out,
            "{}. {} -> {} ({}, answer {})",
            i + 1,
            answer.question_text,
            answer.selected_option_letter.as_deref().unwrap_or("-"),
            verdict,
            answer.correct_option_letter.as_deref().unwrap_or("?")
        )?;
    }
    Ok(())
}
