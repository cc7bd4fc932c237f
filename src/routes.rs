//! Screen addressing.
//!
//! Every screen has a path; the wizard tracker works on those paths, and
//! screens move the user around by emitting them.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::workflow::Navigator;

/// Where sign-in returns to when no callback was given
pub const DEFAULT_CALLBACK: &str = "/courses";

/// Oldest entries fall off the back stack past this depth
const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Courses,
    SignIn { callback: Option<String> },
    Upload,
    Instruct(String),
    Review(String),
    Chunks(String),
    Chat(String),
    Lessons(String),
    TestsEditor(String),
    Quiz(String),
    Scores(String),
    LessonMedia(String),
}

impl Route {
    /// Parse a path such as `/gen/chunks/abc123`
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["courses"] => Route::Courses,
            ["register"] => Route::SignIn {
                callback: query.and_then(|q| query_param(q, "callback")),
            },
            ["gen", "create"] => Route::Upload,
            ["gen", "instruct", id] => Route::Instruct((*id).to_string()),
            ["gen", "review", id] => Route::Review((*id).to_string()),
            ["gen", "chunks", id] => Route::Chunks((*id).to_string()),
            ["gen", "chat", id] => Route::Chat((*id).to_string()),
            ["gen", "lessons", id] => Route::Lessons((*id).to_string()),
            ["gen", "tests", id] => Route::TestsEditor((*id).to_string()),
            ["test", "scores", id] => Route::Scores((*id).to_string()),
            ["test", id] => Route::Quiz((*id).to_string()),
            ["lesson", id] => Route::LessonMedia((*id).to_string()),
            _ => return None,
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Courses => "/courses".to_string(),
            Route::SignIn { callback: Some(cb) } => format!("/register?callback={}", cb),
            Route::SignIn { callback: None } => "/register".to_string(),
            Route::Upload => "/gen/create".to_string(),
            Route::Instruct(id) => format!("/gen/instruct/{}", id),
            Route::Review(id) => format!("/gen/review/{}", id),
            Route::Chunks(id) => format!("/gen/chunks/{}", id),
            Route::Chat(id) => format!("/gen/chat/{}", id),
            Route::Lessons(id) => format!("/gen/lessons/{}", id),
            Route::TestsEditor(id) => format!("/gen/tests/{}", id),
            Route::Quiz(id) => format!("/test/{}", id),
            Route::Scores(id) => format!("/test/scores/{}", id),
            Route::LessonMedia(id) => format!("/lesson/{}", id),
        }
    }

    /// Sign-in route that comes back to `callback`
    pub fn sign_in_then(callback: &str) -> Self {
        Route::SignIn {
            callback: Some(callback.to_string()),
        }
    }

    /// Whether this route is part of the creation wizard
    pub fn is_wizard(&self) -> bool {
        matches!(
            self,
            Route::Upload
                | Route::Instruct(_)
                | Route::Review(_)
                | Route::Chunks(_)
                | Route::Chat(_)
                | Route::Lessons(_)
                | Route::TestsEditor(_)
        )
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Courses => "Courses",
            Route::SignIn { .. } => "Sign in",
            Route::Upload => "Upload",
            Route::Instruct(_) => "Instructions",
            Route::Review(_) => "Review content",
            Route::Chunks(_) => "Chunks",
            Route::Chat(_) => "Course assistant",
            Route::Lessons(_) => "Lessons",
            Route::TestsEditor(_) => "Tests",
            Route::Quiz(_) => "Quiz",
            Route::Scores(_) => "Score",
            Route::LessonMedia(_) => "Lesson decks",
        }
    }
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}

/// Current route plus back history
#[derive(Debug, Clone)]
pub struct Router {
    current: Route,
    history: VecDeque<Route>,
    changed: bool,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            history: VecDeque::new(),
            changed: true,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn current_path(&self) -> String {
        self.current.path()
    }

    pub fn go(&mut self, route: Route) {
        debug!(from = %self.current.path(), to = %route.path(), "navigate");
        let previous = std::mem::replace(&mut self.current, route);
        // Re-entering the same screen reloads it without a new back entry
        if previous != self.current {
            if self.history.len() == MAX_HISTORY {
                self.history.pop_front();
            }
            self.history.push_back(previous);
        }
        self.changed = true;
    }

    /// Return to the previous route; false when there is none
    pub fn back(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.current = previous;
                self.changed = true;
                true
            }
            None => false,
        }
    }

    /// Whether the route changed since the last call
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}

impl Navigator for Router {
    fn navigate(&mut self, path: &str) {
        match Route::parse(path) {
            Some(route) => self.go(route),
            None => warn!(path, "ignoring navigation to unknown path"),
        }
    }
}
