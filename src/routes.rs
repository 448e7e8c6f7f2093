// src/routes.rs

use std::fmt;
use std::sync::Mutex;

/// Every view the front-end can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    Dashboard,
    Quizzes,
    CreateQuiz,
    Quiz(i64),
    Attempt { quiz_id: i64, attempt_id: i64 },
    NotFound,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Quizzes => "/dashboard/quizzes".to_string(),
            Route::CreateQuiz => "/dashboard/create".to_string(),
            Route::Quiz(id) => format!("/quiz/{}", id),
            Route::Attempt {
                quiz_id,
                attempt_id,
            } => format!("/quiz/{}/attempt/{}", quiz_id, attempt_id),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Views behind the auth guard: anonymous users are sent to `Login`.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Quizzes | Route::CreateQuiz | Route::Attempt { .. }
        )
    }

    /// Resolves the route a user actually lands on.
    pub fn guard(self, logged_in: bool) -> Route {
        if self.requires_auth() && !logged_in {
            Route::Login
        } else {
            self
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Moves the front-end to another view. Injected into sessions that navigate.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that keeps the visited routes in order.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.visited.lock().ok()?.last().cloned()
    }

    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!("Navigating to {}", route);
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route);
        }
    }
}
