//! Screen view models.
//!
//! A screen never talks to the backend or the terminal directly. Key presses
//! and command results go in; [`Effect`]s come out and the app carries them
//! out: running a [`Command`], navigating, or raising a notification.

use std::time::Instant;

use crossterm::event::KeyCode;

use crate::api::ApiError;
use crate::auth::SessionSnapshot;
use crate::config::Config;
use crate::routes::Route;
use crate::ui::keybindings::ShortcutContext;

pub mod chat;
pub mod chunks;
pub mod command;
pub mod courses;
pub mod instruct;
pub mod lessons;
pub mod media;
pub mod quiz;
pub mod review;
pub mod scores;
pub mod signin;
pub mod tests_editor;
pub mod upload;

pub use command::{execute, Command, Context, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Error notification for a failed backend call
    pub fn failed(action: &str, error: &ApiError) -> Self {
        Self::error(format!("{}: {}", action, error))
    }
}

/// Something a screen asks the app to do
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Run(Command),
    Navigate(String),
    Notify(Notification),
    /// Fetch the session (revalidating if stale) and deliver it as `Outcome::Session`
    RefreshSession,
}

impl Effect {
    pub fn navigate(route: Route) -> Self {
        Effect::Navigate(route.path())
    }
}

/// Shared behaviour of every screen
pub trait ScreenState {
    /// Effects to run when the screen becomes visible
    fn enter(&mut self) -> Vec<Effect> {
        vec![Effect::RefreshSession]
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Effect>;

    fn apply(&mut self, outcome: Outcome) -> Vec<Effect>;

    /// Called on every UI tick
    fn tick(&mut self, _now: Instant) -> Vec<Effect> {
        Vec::new()
    }

    /// True while text entry or a dialog owns the keyboard
    fn is_capturing(&self) -> bool {
        false
    }

    /// Which shortcut list the help dialog shows
    fn shortcut_context(&self) -> ShortcutContext;
}

/// Redirect to sign-in unless the session is usable, otherwise run `load`
pub fn require_session(
    snapshot: &SessionSnapshot,
    return_to: &Route,
    load: impl FnOnce() -> Vec<Effect>,
) -> Vec<Effect> {
    if snapshot.is_signed_in() {
        load()
    } else {
        vec![Effect::navigate(Route::sign_in_then(&return_to.path()))]
    }
}

/// The visible screen
pub enum Screen {
    Courses(courses::CoursesScreen),
    SignIn(signin::SignInScreen),
    Upload(upload::UploadScreen),
    Instruct(instruct::InstructScreen),
    Review(review::ReviewScreen),
    Chunks(chunks::ChunksScreen),
    Chat(chat::ChatScreen),
    Lessons(lessons::LessonsScreen),
    TestsEditor(tests_editor::TestsEditorScreen),
    Quiz(quiz::QuizScreen),
    Scores(scores::ScoresScreen),
    LessonMedia(media::MediaScreen),
}

impl Screen {
    pub fn for_route(route: &Route, config: &Config) -> Self {
        match route {
            Route::Courses => Screen::Courses(courses::CoursesScreen::new(
                config.ui.search_debounce(),
            )),
            Route::SignIn { callback } => {
                Screen::SignIn(signin::SignInScreen::new(callback.clone()))
            }
            Route::Upload => Screen::Upload(upload::UploadScreen::new()),
            Route::Instruct(id) => Screen::Instruct(instruct::InstructScreen::new(id)),
            Route::Review(id) => Screen::Review(review::ReviewScreen::new(id)),
            Route::Chunks(id) => Screen::Chunks(chunks::ChunksScreen::new(id)),
            Route::Chat(id) => Screen::Chat(chat::ChatScreen::new(id)),
            Route::Lessons(id) => Screen::Lessons(lessons::LessonsScreen::new(id)),
            Route::TestsEditor(id) => {
                Screen::TestsEditor(tests_editor::TestsEditorScreen::new(id))
            }
            Route::Quiz(id) => Screen::Quiz(quiz::QuizScreen::new(id)),
            Route::Scores(id) => Screen::Scores(scores::ScoresScreen::new(id)),
            Route::LessonMedia(id) => Screen::LessonMedia(media::MediaScreen::new(id)),
        }
    }

    pub fn state(&self) -> &dyn ScreenState {
        match self {
            Screen::Courses(s) => s,
            Screen::SignIn(s) => s,
            Screen::Upload(s) => s,
            Screen::Instruct(s) => s,
            Screen::Review(s) => s,
            Screen::Chunks(s) => s,
            Screen::Chat(s) => s,
            Screen::Lessons(s) => s,
            Screen::TestsEditor(s) => s,
            Screen::Quiz(s) => s,
            Screen::Scores(s) => s,
            Screen::LessonMedia(s) => s,
        }
    }

    pub fn state_mut(&mut self) -> &mut dyn ScreenState {
        match self {
            Screen::Courses(s) => s,
            Screen::SignIn(s) => s,
            Screen::Upload(s) => s,
            Screen::Instruct(s) => s,
            Screen::Review(s) => s,
            Screen::Chunks(s) => s,
            Screen::Chat(s) => s,
            Screen::Lessons(s) => s,
            Screen::TestsEditor(s) => s,
            Screen::Quiz(s) => s,
            Screen::Scores(s) => s,
            Screen::LessonMedia(s) => s,
        }
    }
}

/// Keep a list cursor inside `len` items
pub(crate) fn clamp_selection(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

/// j/k and arrow movement over a list; true when the key was a movement key
pub(crate) fn move_selection(selected: &mut usize, len: usize, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => {
            if *selected + 1 < len {
                *selected += 1;
            }
            true
        }
        KeyCode::Up | KeyCode::Char('k') => {
            *selected = selected.saturating_sub(1);
            true
        }
        KeyCode::Home | KeyCode::Char('g') => {
            *selected = 0;
            true
        }
        KeyCode::End | KeyCode::Char('G') => {
            *selected = len.saturating_sub(1);
            true
        }
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_session_redirects_with_callback() {
        let effects = require_session(&SessionSnapshot::default(), &Route::Courses, || {
            vec![Effect::Run(Command::LoadCourses)]
        });
        assert_eq!(
            effects,
            vec![Effect::Navigate("/register?callback=/courses".to_string())]
        );

        let effects = require_session(&testing::signed_in(), &Route::Courses, || {
            vec![Effect::Run(Command::LoadCourses)]
        });
        assert_eq!(effects, vec![Effect::Run(Command::LoadCourses)]);
    }

    #[test]
    fn test_move_selection_clamps() {
        let mut selected = 0;
        move_selection(&mut selected, 3, KeyCode::Up);
        assert_eq!(selected, 0);
        move_selection(&mut selected, 3, KeyCode::Char('G'));
        assert_eq!(selected, 2);
        move_selection(&mut selected, 3, KeyCode::Down);
        assert_eq!(selected, 2);
        assert!(!move_selection(&mut selected, 3, KeyCode::Enter));
    }

    #[test]
    fn test_screen_for_every_route() {
        let config = Config::default();
        let routes = [
            Route::Courses,
            Route::sign_in_then("/courses"),
            Route::Upload,
            Route::Quiz("c1".to_string()),
            Route::LessonMedia("c1".to_string()),
        ];
        for route in &routes {
            let mut screen = Screen::for_route(route, &config);
            assert!(
                !screen.state_mut().enter().is_empty(),
                "{:?} should ask for the session on entry",
                route
            );
        }
    }
}
