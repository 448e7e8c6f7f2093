// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kwizify::{
    ApiClient,
    routes::HistoryNavigator,
    session::auth::AuthSession,
    token::TokenStore,
    utils::jwt::{Claims, now_secs},
};
use serde_json::{Value, json};
use url::Url;

pub const JWT_SECRET: &[u8] = b"test_secret_for_integration_tests";

#[derive(Debug, Clone)]
pub struct Submission {
    pub quiz_id: i64,
    pub user_id: i64,
    pub time_spent_seconds: u64,
    pub letters: Vec<String>,
}

#[derive(Debug, Clone)]
struct Account {
    id: i64,
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct Attempt {
    id: i64,
    quiz_id: i64,
    user_id: i64,
    started_at: String,
    completed_at: Option<String>,
    time_spent_seconds: Option<u64>,
    score: Option<f64>,
    letters: Vec<String>,
}

#[derive(Default)]
struct Db {
    accounts: Vec<Account>,
    quizzes: Vec<Value>,
    attempts: Vec<Attempt>,
    submissions: Vec<Submission>,
    uploads: Vec<(String, usize)>,
}

/// In-memory stand-in for the remote API.
#[derive(Clone, Default)]
pub struct MockApi {
    db: Arc<Mutex<Db>>,
}

impl MockApi {
    pub fn submissions(&self) -> Vec<Submission> {
        self.db.lock().unwrap().submissions.clone()
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.db.lock().unwrap().uploads.clone()
    }

    pub fn quiz(&self, id: i64) -> Option<Value> {
        let db = self.db.lock().unwrap();
        db.quizzes.iter().find(|q| q["id"] == id).cloned()
    }

    /// Adds a quiz whose questions have four options A-D;
    /// `correct` holds the index of the correct option per question.
    pub fn seed_quiz(&self, creator_id: i64, title: &str, correct: &[usize]) -> i64 {
        let mut db = self.db.lock().unwrap();
        let id = db.quizzes.len() as i64 + 1;
        let questions: Vec<Value> = correct
            .iter()
            .enumerate()
            .map(|(qi, &right)| {
                let qid = id * 100 + qi as i64;
                let options: Vec<Value> = (0..4)
                    .map(|oi| {
                        json!({
                            "id": qid * 10 + oi as i64,
                            "text": format!("Option {} of question {}", oi + 1, qi + 1),
                            "is_correct": oi == right,
                        })
                    })
                    .collect();
                json!({
                    "id": qid,
                    "question_text": format!("Question {} of {}", qi + 1, title),
                    "options": options,
                })
            })
            .collect();
        db.quizzes.push(json!({
            "id": id,
            "title": title,
            "description": "",
            "creator_id": creator_id,
            "created_at": "2025-03-01T09:30:00",
            "questions": questions,
        }));
        id
    }
}

pub struct TestApp {
    pub address: String,
    pub mock: MockApi,
}

impl TestApp {
    pub fn url(&self) -> Url {
        Url::parse(&self.address).unwrap()
    }

    /// Client with its own in-memory token slot.
    pub fn client(&self) -> Arc<ApiClient> {
        Arc::new(ApiClient::new(self.url(), TokenStore::memory()))
    }

    pub fn auth_session(&self, client: &Arc<ApiClient>) -> (AuthSession, Arc<HistoryNavigator>) {
        let navigator = Arc::new(HistoryNavigator::new());
        let session = AuthSession::new(client.clone(), client.tokens().clone(), navigator.clone());
        (session, navigator)
    }
}

/// Spawns the mock API on a random port.
pub async fn spawn_app() -> TestApp {
    let mock = MockApi::default();

    let app = Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/auth/me", get(me))
        .route("/api/questions/quiz/{id}", get(get_quiz))
        .route("/api/questions/user/{id}/quizzes", get(user_quizzes))
        .route("/api/quiz/quiz-attempts/start", post(start_attempt))
        .route("/api/quiz/quiz-attempts/submit", post(submit_attempt))
        .route("/api/quiz/quiz-attempts/user/{id}", get(user_attempts))
        .route("/api/quiz/quiz-attempts/{id}", get(attempt_detail))
        .route("/api/keywords/extract-keywords/", post(extract_keywords))
        .route("/api/questions/generate-questions/", post(generate_questions))
        .route("/api/keywords/save-quiz/", post(save_quiz))
        .route("/errors/plain", get(plain_error))
        .route("/errors/empty", get(empty_error))
        .route("/errors/structured", get(structured_error))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, mock }
}

pub fn issue_token(username: &str, ttl_secs: i64) -> String {
    let claims = Claims {
        sub: Some(username.to_string()),
        exp: (now_secs() as i64 + ttl_secs).max(0) as u64,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET)).unwrap()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.id,
        "username": account.username,
        "email": account.email,
        "is_active": true,
        "created_at": "2025-01-01T00:00:00",
    })
}

/// Resolves the bearer token to an account id, or a 401 response.
fn authorize(mock: &MockApi, headers: &HeaderMap) -> Result<i64, Response> {
    let unauthorized = || detail(StatusCode::UNAUTHORIZED, "Could not validate credentials");
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let claims = decode::<Claims>(token, &DecodingKey::from_secret(JWT_SECRET), &Validation::default())
        .map_err(|_| unauthorized())?
        .claims;
    let db = mock.db.lock().unwrap();
    db.accounts
        .iter()
        .find(|a| Some(&a.username) == claims.sub.as_ref())
        .map(|a| a.id)
        .ok_or_else(unauthorized)
}

async fn sign_in(State(mock): State<MockApi>, Json(body): Json<Value>) -> Response {
    let db = mock.db.lock().unwrap();
    let found = db
        .accounts
        .iter()
        .find(|a| body["username"] == a.username.as_str() && body["password"] == a.password.as_str());
    match found {
        Some(account) => Json(json!({
            "access_token": issue_token(&account.username, 3600),
            "token_type": "bearer",
        }))
        .into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Incorrect username or password"),
    }
}

async fn sign_up(State(mock): State<MockApi>, Json(body): Json<Value>) -> Response {
    let mut db = mock.db.lock().unwrap();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if db.accounts.iter().any(|a| a.username == username) {
        return detail(StatusCode::BAD_REQUEST, "Username already registered");
    }
    let account = Account {
        id: db.accounts.len() as i64 + 1,
        username,
        email: body["email"].as_str().unwrap_or_default().to_string(),
        password: body["password"].as_str().unwrap_or_default().to_string(),
    };
    let response = user_json(&account);
    db.accounts.push(account);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn me(State(mock): State<MockApi>, headers: HeaderMap) -> Response {
    let id = match authorize(&mock, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let db = mock.db.lock().unwrap();
    let account = db.accounts.iter().find(|a| a.id == id).unwrap();
    Json(user_json(account)).into_response()
}

async fn get_quiz(State(mock): State<MockApi>, Path(id): Path<i64>) -> Response {
    match mock.quiz(id) {
        Some(quiz) => Json(quiz).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Quiz not found"),
    }
}

async fn user_quizzes(State(mock): State<MockApi>, Path(user_id): Path<i64>) -> Response {
    let db = mock.db.lock().unwrap();
    let quizzes: Vec<Value> = db
        .quizzes
        .iter()
        .filter(|q| q["creator_id"] == user_id)
        .map(|q| {
            json!({
                "id": q["id"],
                "title": q["title"],
                "description": q["description"],
                "created_at": q["created_at"],
                "question_count": q["questions"].as_array().map(|a| a.len()).unwrap_or(0),
            })
        })
        .collect();
    Json(quizzes).into_response()
}

fn query_i64(query: &HashMap<String, String>, key: &str) -> i64 {
    query.get(key).and_then(|v| v.parse().ok()).unwrap_or_default()
}

async fn start_attempt(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(response) = authorize(&mock, &headers) {
        return response;
    }
    let quiz_id = query_i64(&query, "quiz_id");
    if mock.quiz(quiz_id).is_none() {
        return detail(StatusCode::NOT_FOUND, "Quiz not found");
    }
    let mut db = mock.db.lock().unwrap();
    let attempt = Attempt {
        id: db.attempts.len() as i64 + 1,
        quiz_id,
        user_id: query_i64(&query, "user_id"),
        started_at: now_stamp(),
        completed_at: None,
        time_spent_seconds: None,
        score: None,
        letters: Vec::new(),
    };
    let response = json!({ "attempt_id": attempt.id, "started_at": attempt.started_at });
    db.attempts.push(attempt);
    Json(response).into_response()
}

fn correct_letters(quiz: &Value) -> Vec<String> {
    quiz["questions"]
        .as_array()
        .map(|questions| {
            questions
                .iter()
                .map(|q| {
                    let index = q["options"]
                        .as_array()
                        .and_then(|o| o.iter().position(|o| o["is_correct"] == true))
                        .unwrap_or(0);
                    ((b'A' + index as u8) as char).to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn submit_attempt(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(letters): Json<Vec<String>>,
) -> Response {
    if let Err(response) = authorize(&mock, &headers) {
        return response;
    }
    let quiz_id = query_i64(&query, "quiz_id");
    let user_id = query_i64(&query, "user_id");
    let time_spent_seconds = query_i64(&query, "time_spent_seconds") as u64;
    let Some(quiz) = mock.quiz(quiz_id) else {
        return detail(StatusCode::NOT_FOUND, "Quiz not found");
    };

    let key = correct_letters(&quiz);
    let correct = key.iter().zip(&letters).filter(|(k, l)| k == l).count();
    let total = key.len();
    let score = if total == 0 { 0.0 } else { correct as f64 * 100.0 / total as f64 };

    let mut db = mock.db.lock().unwrap();
    let Some(attempt) = db
        .attempts
        .iter_mut()
        .rev()
        .find(|a| a.quiz_id == quiz_id && a.user_id == user_id && a.completed_at.is_none())
    else {
        return detail(StatusCode::BAD_REQUEST, "No active attempt found");
    };
    attempt.completed_at = Some(now_stamp());
    attempt.time_spent_seconds = Some(time_spent_seconds);
    attempt.score = Some(score);
    attempt.letters = letters.clone();
    let attempt_id = attempt.id;

    db.submissions.push(Submission {
        quiz_id,
        user_id,
        time_spent_seconds,
        letters,
    });

    Json(json!({
        "attempt_id": attempt_id,
        "score": score,
        "correct_answers": correct,
        "total_questions": total,
        "time_spent_seconds": time_spent_seconds,
    }))
    .into_response()
}

fn attempt_json(attempt: &Attempt, title: &Value) -> Value {
    json!({
        "attempt_id": attempt.id,
        "quiz_id": attempt.quiz_id,
        "quiz_title": title,
        "user_id": attempt.user_id,
        "started_at": attempt.started_at,
        "completed_at": attempt.completed_at,
        "time_spent_seconds": attempt.time_spent_seconds,
        "score": attempt.score,
    })
}

async fn user_attempts(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
) -> Response {
    if let Err(response) = authorize(&mock, &headers) {
        return response;
    }
    let db = mock.db.lock().unwrap();
    let attempts: Vec<Value> = db
        .attempts
        .iter()
        .filter(|a| a.user_id == user_id)
        .map(|a| {
            let title = db
                .quizzes
                .iter()
                .find(|q| q["id"] == a.quiz_id)
                .map(|q| q["title"].clone())
                .unwrap_or(Value::Null);
            attempt_json(a, &title)
        })
        .collect();
    Json(attempts).into_response()
}

async fn attempt_detail(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(response) = authorize(&mock, &headers) {
        return response;
    }
    let attempt = {
        let db = mock.db.lock().unwrap();
        db.attempts.iter().find(|a| a.id == id).cloned()
    };
    let Some(attempt) = attempt else {
        return detail(StatusCode::NOT_FOUND, "Attempt not found");
    };
    let Some(quiz) = mock.quiz(attempt.quiz_id) else {
        return detail(StatusCode::NOT_FOUND, "Quiz not found");
    };

    let key = correct_letters(&quiz);
    let answers: Vec<Value> = quiz["questions"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let selected = attempt.letters.get(i).filter(|l| !l.is_empty()).cloned();
            let selected_id = selected.as_ref().and_then(|l| {
                let index = (l.as_bytes()[0] - b'A') as usize;
                q["options"][index]["id"].as_i64()
            });
            json!({
                "question_id": q["id"],
                "question_text": q["question_text"],
                "selected_option_id": selected_id,
                "selected_option_letter": selected,
                "correct_option_letter": key[i],
                "is_correct": selected.as_deref() == Some(key[i].as_str()),
                "options": q["options"],
            })
        })
        .collect();

    let mut body = attempt_json(&attempt, &quiz["title"]);
    body["answers"] = Value::Array(answers);
    Json(body).into_response()
}

async fn extract_keywords(State(mock): State<MockApi>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            return detail(StatusCode::BAD_REQUEST, "Could not read upload");
        };
        if bytes.is_empty() {
            return detail(StatusCode::BAD_REQUEST, "Uploaded file is empty");
        }
        mock.db.lock().unwrap().uploads.push((name, bytes.len()));
        return Json(json!({
            "keywords": ["ownership", "borrowing"],
            "questions": [
                {
                    "question": "What does the borrow checker enforce?",
                    "options": ["Aliasing rules", "Formatting", "Naming"],
                    "correct_answer": "Aliasing rules",
                },
                {
                    "question": "Who owns a moved value?",
                    "options": ["The new binding", "The old binding"],
                    "correct_answer": "The new binding",
                },
            ],
        }))
        .into_response();
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [{ "loc": ["body", "file"], "msg": "Field required" }] })),
    )
        .into_response()
}

async fn generate_questions(mut multipart: Multipart) -> Response {
    let mut keywords = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("keywords") {
            if let Ok(text) = field.text().await {
                keywords.push(text);
            }
        }
    }
    let questions: Vec<Value> = keywords
        .iter()
        .map(|k| {
            json!({
                "question": format!("Which statement about {} is true?", k),
                "options": ["The first", "The second"],
                "correct_answer": "The second",
            })
        })
        .collect();
    Json(questions).into_response()
}

async fn save_quiz(
    State(mock): State<MockApi>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(questions): Json<Vec<Value>>,
) -> Response {
    if let Err(response) = authorize(&mock, &headers) {
        return response;
    }
    let title = query.get("quiz_title").cloned().unwrap_or_default();
    let correct: Vec<usize> = questions
        .iter()
        .map(|q| {
            q["options"]
                .as_array()
                .and_then(|o| o.iter().position(|o| *o == q["correct_answer"]))
                .unwrap_or(0)
        })
        .collect();
    let quiz_id = mock.seed_quiz(query_i64(&query, "user_id"), &title, &correct);
    if let Some(description) = query.get("quiz_description") {
        let mut db = mock.db.lock().unwrap();
        if let Some(quiz) = db.quizzes.iter_mut().find(|q| q["id"] == quiz_id) {
            quiz["description"] = json!(description);
        }
    }
    Json(json!({ "quiz_id": quiz_id })).into_response()
}

async fn plain_error() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream down").into_response()
}

async fn empty_error() -> Response {
    StatusCode::IM_A_TEAPOT.into_response()
}

async fn structured_error() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [{ "loc": ["query", "quiz_id"], "msg": "Field required" }] })),
    )
        .into_response()
}
