//! End-to-end flows through the app, driven key by key.
//!
//! The app runs against the in-memory backend from `common`; no terminal is
//! involved. After each interaction `settle` applies background results until
//! nothing more arrives.

mod common;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;
use tempfile::TempDir;

use common::{FakeBackend, ListScript, EMAIL, PASSWORD};
use elevan::app::App;
use elevan::config::Config;
use elevan::routes::Route;
use elevan::screens::chat::Role;
use elevan::screens::Screen;

const IDLE: Duration = Duration::from_millis(200);

// ─── Harness ──────────────────────────────────────────────────────────────────

struct Harness {
    app: App,
    backend: Arc<FakeBackend>,
    _downloads: TempDir,
}

impl Harness {
    /// Enter the first screen without waiting for anything it started
    fn new(backend: FakeBackend, signed_in: bool, route: Route) -> Self {
        let backend = Arc::new(backend);
        let downloads = TempDir::new().expect("Failed to create temp dir");
        let ctx = common::context(backend.clone(), signed_in, downloads.path());

        let mut app = App::new(Config::default(), ctx, route);
        app.sync_route();

        Self {
            app,
            backend,
            _downloads: downloads,
        }
    }

    async fn start(backend: FakeBackend, signed_in: bool, route: Route) -> Self {
        let mut h = Self::new(backend, signed_in, route);
        h.app.settle(IDLE).await;
        h
    }

    async fn press(&mut self, key: KeyCode) {
        self.app.handle_key(key);
        self.app.settle(IDLE).await;
    }

    /// Each character as its own key press, settling only at the end
    async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.app.handle_key(KeyCode::Char(c));
        }
        self.app.settle(IDLE).await;
    }

    fn route(&self) -> &Route {
        self.app.current_route()
    }

    fn toast_messages(&self) -> Vec<String> {
        self.app
            .toasts()
            .iter()
            .map(|t| t.notification.message.clone())
            .collect()
    }
}

// ─── Sign-in ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_signed_out_course_list_redirects_to_sign_in() {
    let h = Harness::start(FakeBackend::seeded(), false, Route::Courses).await;

    assert_eq!(h.route(), &Route::sign_in_then("/courses"));
    assert_eq!(h.backend.call_count("list_courses"), 0);
}

#[tokio::test]
async fn test_sign_in_returns_to_callback_and_loads_courses() {
    let mut h = Harness::start(FakeBackend::seeded(), false, Route::Courses).await;

    h.type_text(EMAIL).await;
    h.press(KeyCode::Enter).await;
    h.type_text(PASSWORD).await;
    h.press(KeyCode::Enter).await;

    assert_eq!(h.route(), &Route::Courses);
    match h.app.screen() {
        Screen::Courses(screen) => {
            assert_eq!(screen.all.len(), 2);
            assert!(!screen.loading);
        }
        _ => panic!("expected the course list"),
    }
}

#[tokio::test]
async fn test_wrong_password_stays_on_sign_in() {
    let mut h = Harness::start(FakeBackend::seeded(), false, Route::Courses).await;

    h.type_text(EMAIL).await;
    h.press(KeyCode::Enter).await;
    h.type_text("nope").await;
    h.press(KeyCode::Enter).await;

    assert!(matches!(h.route(), Route::SignIn { .. }));
    assert!(h
        .toast_messages()
        .iter()
        .any(|m| m.starts_with("Sign-in failed")));
    match h.app.screen() {
        Screen::SignIn(screen) => {
            assert!(!screen.submitting);
        }
        _ => panic!("expected the sign-in screen"),
    }
}

// ─── Courses ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_course_after_confirmation() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Courses).await;

    h.press(KeyCode::Char('d')).await;
    // Confirmation defaults to No; Enter alone must not delete
    h.press(KeyCode::Enter).await;
    assert_eq!(h.backend.call_count("delete_course"), 0);

    h.press(KeyCode::Char('d')).await;
    h.press(KeyCode::Char('y')).await;

    assert_eq!(h.backend.call_count("delete_course"), 1);
    match h.app.screen() {
        Screen::Courses(screen) => {
            let ids: Vec<&str> = screen.all.iter().map(|c| c.course_id.as_str()).collect();
            assert_eq!(ids, vec!["c2"]);
            assert!(screen.deleting.is_none());
        }
        _ => panic!("expected the course list"),
    }
    assert!(h.toast_messages().contains(&"Course deleted".to_string()));
}

#[tokio::test]
async fn test_result_for_a_screen_that_is_gone_is_dropped() {
    let backend = FakeBackend::seeded();
    backend.state().list_script.push_back(ListScript {
        delay: Duration::from_millis(100),
        fail: true,
    });
    let mut h = Harness::new(backend, true, Route::Courses);

    // Let the session arrive and the slow load start, then leave and come back
    h.app.settle(Duration::from_millis(20)).await;
    h.app.handle_key(KeyCode::Char('n'));
    h.app.handle_key(KeyCode::Esc);
    h.app.handle_key(KeyCode::Esc);
    h.app.settle(Duration::from_millis(300)).await;

    assert_eq!(h.route(), &Route::Courses);
    match h.app.screen() {
        Screen::Courses(screen) => {
            assert_eq!(screen.all.len(), 2);
            assert!(screen.load_error.is_none());
        }
        _ => panic!("expected the course list"),
    }
    assert!(!h
        .toast_messages()
        .iter()
        .any(|m| m.starts_with("Could not load courses")));
}

// ─── Wizard ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_step_keys_only_go_back() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Chunks("c1".to_string())).await;

    // Chat is ahead of Chunks
    h.press(KeyCode::Char('5')).await;
    assert_eq!(h.route(), &Route::Chunks("c1".to_string()));

    h.press(KeyCode::Char('2')).await;
    assert_eq!(h.route(), &Route::Instruct("c1".to_string()));
}

#[tokio::test]
async fn test_upload_creates_course_and_opens_instructions() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Upload).await;

    h.type_text("https://example.com/article").await;
    h.press(KeyCode::Enter).await;

    assert_eq!(h.route(), &Route::Instruct("c9".to_string()));
    let calls = h.backend.calls();
    let submit = calls.iter().position(|c| c == "submit_content");
    let generate = calls.iter().position(|c| c == "generate_instructions");
    assert!(submit.is_some() && generate > submit);
}

#[tokio::test]
async fn test_chat_reply_streams_into_the_transcript() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Chat("c1".to_string())).await;

    h.type_text("What is ownership?").await;
    h.press(KeyCode::Enter).await;

    match h.app.screen() {
        Screen::Chat(screen) => {
            assert!(!screen.busy);
            assert_eq!(screen.messages.len(), 2);
            assert_eq!(screen.messages[0].role, Role::User);
            assert_eq!(screen.messages[0].text, "What is ownership?");
            assert_eq!(screen.messages[1].role, Role::Assistant);
            assert_eq!(screen.messages[1].text, "Hello, world");
        }
        _ => panic!("expected the chat screen"),
    }
}

// ─── Quiz ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_quiz_submission_shows_score() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Quiz("c1".to_string())).await;

    // First question right, second wrong
    h.press(KeyCode::Enter).await;
    h.press(KeyCode::Char('l')).await;
    h.press(KeyCode::Char('j')).await;
    h.press(KeyCode::Enter).await;
    h.press(KeyCode::Char('f')).await;

    assert_eq!(h.route(), &Route::Scores("c1".to_string()));
    match h.app.screen() {
        Screen::Scores(screen) => {
            let score = screen
                .score
                .clone()
                .flatten()
                .expect("score should be loaded");
            assert_eq!(score.correct_score, 1);
            assert_eq!(score.incorrect_score, 1);
            assert_eq!(score.percentage(), 50);
        }
        _ => panic!("expected the scores screen"),
    }
}

#[tokio::test]
async fn test_quiz_submission_without_session_asks_to_sign_in() {
    let mut h = Harness::start(FakeBackend::seeded(), false, Route::Quiz("c1".to_string())).await;

    h.press(KeyCode::Enter).await;
    h.press(KeyCode::Char('f')).await;

    assert_eq!(h.route(), &Route::Quiz("c1".to_string()));
    assert!(h
        .toast_messages()
        .contains(&"You must be signed in to submit scores".to_string()));
}

// ─── Media ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deck_download_is_saved() {
    let mut h = Harness::start(
        FakeBackend::seeded(),
        true,
        Route::LessonMedia("c1".to_string()),
    )
    .await;

    h.press(KeyCode::Char('d')).await;

    assert_eq!(h.backend.call_count("download_pdf"), 1);
    match h.app.screen() {
        Screen::LessonMedia(screen) => {
            assert_eq!(screen.saved.len(), 1);
            let saved = &screen.saved[0];
            assert!(saved.ends_with("Lessons_c1.pdf"));
            assert_eq!(std::fs::read(saved).unwrap(), b"deck-bytes");
        }
        _ => panic!("expected the media screen"),
    }
}

// ─── Global keys ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_help_closes_on_any_key_and_q_quits() {
    let mut h = Harness::start(FakeBackend::seeded(), true, Route::Courses).await;

    h.press(KeyCode::Char('?')).await;
    assert!(h.app.help_visible());

    // Swallowed by the help dialog
    h.press(KeyCode::Char('q')).await;
    assert!(!h.app.help_visible());
    assert!(!h.app.should_quit());

    h.press(KeyCode::Char('q')).await;
    assert!(h.app.should_quit());
}
