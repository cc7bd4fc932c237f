//! Shared fakes for the integration tests.
//!
//! `FakeBackend` keeps courses, chunks, lessons, tests and scores in memory
//! and records every call it receives. `FakeIdentity` knows exactly one
//! account. Nothing here touches the network or the terminal.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use elevan::api::{
    ApiError, AuthContext, Backend, ChatRequest, ChatStream, Chunk, CourseContent, CourseInfo,
    Instructions, Lesson, MediaFormat, Score, ScoreAck, ScoreSubmission, Test,
};
use elevan::auth::{
    IdentityProvider, IdentitySession, MemorySessionStore, PersistedSession, SessionCache,
    StaticBilling, SystemClock,
};
use elevan::screens::Context;

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct horse";
pub const TOKEN: &str = "tok-1";
pub const USER_ID: &str = "u1";

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn course(id: &str, name: &str) -> CourseInfo {
    CourseInfo {
        course_id: id.to_string(),
        author_id: USER_ID.to_string(),
        name: name.to_string(),
        source: format!("https://example.com/{}", id),
        total_questions: 2,
    }
}

pub fn chunk(id: &str, course_id: &str) -> Chunk {
    Chunk {
        chunk_id: id.to_string(),
        source_id: course_id.to_string(),
        chunk_title: format!("Chunk {}", id),
        chunk_content: format!("Content of {}", id),
    }
}

pub fn test_question(id: &str, course_id: &str, chunk_id: &str) -> Test {
    Test {
        test_id: id.to_string(),
        course_id: course_id.to_string(),
        chunk_id: chunk_id.to_string(),
        test_question: format!("Question {}?", id),
        correct_option: "right".to_string(),
        incorrect_options: vec!["wrong".to_string(), "also wrong".to_string()],
    }
}

// ─── Fake Backend ─────────────────────────────────────────────────────────────

/// Scripted behaviour of one `list_courses` call
#[derive(Debug, Clone, Copy)]
pub struct ListScript {
    pub delay: Duration,
    pub fail: bool,
}

#[derive(Default)]
pub struct FakeState {
    pub courses: Vec<CourseInfo>,
    pub chunks: Vec<Chunk>,
    pub lessons: Vec<Lesson>,
    pub tests: Vec<Test>,
    pub instructions: HashMap<String, Instructions>,
    pub content: HashMap<String, CourseContent>,
    pub scores: Vec<Score>,
    /// Raw body chunks of the next chat reply
    pub chat_reply: Vec<String>,
    pub deck: Vec<u8>,
    /// Id handed out by `submit_content`
    pub next_course_id: String,
    /// Consumed front to back; calls beyond the script succeed at once
    pub list_script: VecDeque<ListScript>,
    /// Operation names in call order
    pub calls: Vec<String>,
    /// Identity seen by each call, same order as `calls`
    pub auths: Vec<AuthContext>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two courses; `c1` has two chunks and two questions
    pub fn seeded() -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state();
            state.courses = vec![course("c1", "Rust basics"), course("c2", "Tokio deep dive")];
            state.chunks = vec![chunk("k1", "c1"), chunk("k2", "c1")];
            state.tests = vec![
                test_question("t1", "c1", "k1"),
                test_question("t2", "c1", "k2"),
            ];
            state.next_course_id = "c9".to_string();
            state.deck = b"deck-bytes".to_vec();
            state.chat_reply = vec![
                "data: Hel".to_string(),
                "lo\n\ndata: , world\n\n".to_string(),
                "data: [DONE]\n\n".to_string(),
            ];
        }
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == operation).count()
    }

    fn record(&self, operation: &str, auth: &AuthContext) {
        let mut state = self.state();
        state.calls.push(operation.to_string());
        state.auths.push(auth.clone());
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::from_status("backend", 404, &format!(r#"{{"detail": "{} not found"}}"#, what))
}

fn remove_where<T>(items: &mut Vec<T>, what: &str, pred: impl Fn(&T) -> bool) -> Result<(), ApiError> {
    match items.iter().position(pred) {
        Some(index) => {
            items.remove(index);
            Ok(())
        }
        None => Err(not_found(what)),
    }
}

fn replace_where<T: Clone>(
    items: &mut [T],
    item: &T,
    what: &str,
    pred: impl Fn(&T) -> bool,
) -> Result<(), ApiError> {
    match items.iter_mut().find(|i| pred(i)) {
        Some(slot) => {
            *slot = item.clone();
            Ok(())
        }
        None => Err(not_found(what)),
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_courses(&self, auth: &AuthContext) -> Result<Vec<CourseInfo>, ApiError> {
        self.record("list_courses", auth);
        let script = self.state().list_script.pop_front();
        if let Some(script) = script {
            tokio::time::sleep(script.delay).await;
            if script.fail {
                return Err(ApiError::from_status("backend", 500, "boom"));
            }
        }
        Ok(self.state().courses.clone())
    }

    async fn delete_course(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError> {
        self.record("delete_course", auth);
        remove_where(&mut self.state().courses, "course", |c| c.course_id == course_id)
    }

    async fn submit_content(&self, auth: &AuthContext, link: &str) -> Result<String, ApiError> {
        self.record("submit_content", auth);
        let mut state = self.state();
        let id = state.next_course_id.clone();
        if !id.is_empty() {
            state.courses.push(CourseInfo {
                course_id: id.clone(),
                author_id: auth.user_id.clone().unwrap_or_default(),
                name: "upload".to_string(),
                source: link.to_string(),
                total_questions: 0,
            });
        }
        Ok(id)
    }

    async fn generate_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<(), ApiError> {
        self.record("generate_instructions", auth);
        self.state().instructions.insert(
            course_id.to_string(),
            Instructions {
                course_id: Some(course_id.to_string()),
                title: "Generated".to_string(),
                ..Instructions::default()
            },
        );
        Ok(())
    }

    async fn get_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<Instructions>, ApiError> {
        self.record("get_instructions", auth);
        Ok(self.state().instructions.get(course_id).cloned())
    }

    async fn save_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
        instructions: &Instructions,
    ) -> Result<(), ApiError> {
        self.record("save_instructions", auth);
        self.state()
            .instructions
            .insert(course_id.to_string(), instructions.clone());
        Ok(())
    }

    async fn get_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<CourseContent>, ApiError> {
        self.record("get_course_content", auth);
        Ok(self.state().content.get(course_id).cloned())
    }

    async fn update_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
        content: &CourseContent,
    ) -> Result<(), ApiError> {
        self.record("update_course_content", auth);
        self.state()
            .content
            .insert(course_id.to_string(), content.clone());
        Ok(())
    }

    async fn list_chunks(&self, auth: &AuthContext, course_id: &str) -> Result<Vec<Chunk>, ApiError> {
        self.record("list_chunks", auth);
        Ok(self
            .state()
            .chunks
            .iter()
            .filter(|c| c.source_id == course_id)
            .cloned()
            .collect())
    }

    async fn update_chunk(&self, auth: &AuthContext, chunk: &Chunk) -> Result<(), ApiError> {
        self.record("update_chunk", auth);
        replace_where(&mut self.state().chunks, chunk, "chunk", |c| {
            c.chunk_id == chunk.chunk_id
        })
    }

    async fn delete_chunk(&self, auth: &AuthContext, chunk_id: &str) -> Result<(), ApiError> {
        self.record("delete_chunk", auth);
        remove_where(&mut self.state().chunks, "chunk", |c| c.chunk_id == chunk_id)
    }

    async fn list_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Vec<Lesson>, ApiError> {
        self.record("list_lessons", auth);
        Ok(self
            .state()
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn update_lesson(&self, auth: &AuthContext, lesson: &Lesson) -> Result<(), ApiError> {
        self.record("update_lesson", auth);
        replace_where(&mut self.state().lessons, lesson, "lesson", |l| {
            l.lesson_id == lesson.lesson_id
        })
    }

    async fn delete_lesson(&self, auth: &AuthContext, lesson_id: &str) -> Result<(), ApiError> {
        self.record("delete_lesson", auth);
        remove_where(&mut self.state().lessons, "lesson", |l| l.lesson_id == lesson_id)
    }

    async fn list_tests(&self, auth: &AuthContext, course_id: &str) -> Result<Vec<Test>, ApiError> {
        self.record("list_tests", auth);
        Ok(self
            .state()
            .tests
            .iter()
            .filter(|t| t.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn update_test(&self, auth: &AuthContext, test: &Test) -> Result<(), ApiError> {
        self.record("update_test", auth);
        replace_where(&mut self.state().tests, test, "test", |t| t.test_id == test.test_id)
    }

    async fn delete_test(&self, auth: &AuthContext, test_id: &str) -> Result<(), ApiError> {
        self.record("delete_test", auth);
        remove_where(&mut self.state().tests, "test", |t| t.test_id == test_id)
    }

    async fn generate_tests(&self, auth: &AuthContext, _course_id: &str) -> Result<(), ApiError> {
        self.record("generate_tests", auth);
        Ok(())
    }

    async fn generate_lessons(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError> {
        self.record("generate_lessons", auth);
        let mut state = self.state();
        let chunk_ids: Vec<String> = state
            .chunks
            .iter()
            .filter(|c| c.source_id == course_id)
            .map(|c| c.chunk_id.clone())
            .collect();
        for (i, chunk_id) in chunk_ids.into_iter().enumerate() {
            state.lessons.push(Lesson {
                lesson_id: format!("l{}", i + 1),
                course_id: course_id.to_string(),
                chunk_id,
                title: format!("Lesson {}", i + 1),
                subtitle: String::new(),
                bullet_points: vec!["point".to_string()],
            });
        }
        Ok(())
    }

    async fn chat(&self, auth: &AuthContext, _request: &ChatRequest) -> Result<ChatStream, ApiError> {
        self.record("chat", auth);
        Ok(ChatStream::from_chunks(self.state().chat_reply.clone()))
    }

    async fn download_lessons(
        &self,
        auth: &AuthContext,
        _course_id: &str,
        format: MediaFormat,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(&format!("download_{}", format.extension()), auth);
        Ok(self.state().deck.clone())
    }

    async fn add_score(
        &self,
        auth: &AuthContext,
        submission: &ScoreSubmission,
    ) -> Result<ScoreAck, ApiError> {
        self.record("add_score", auth);
        let Some(user_id) = auth.user_id.clone() else {
            return Err(ApiError::from_status(
                "backend",
                422,
                r#"{"detail": "user_id is required"}"#,
            ));
        };

        let mut state = self.state();
        let score = Score {
            score_id: None,
            course_id: submission.course_id.clone(),
            user_id: Some(user_id.clone()),
            correct_score: submission.correct_score,
            incorrect_score: submission.incorrect_score,
        };
        let existing = state.scores.iter_mut().find(|s| {
            s.course_id == submission.course_id && s.user_id.as_deref() == Some(user_id.as_str())
        });
        let msg = match existing {
            Some(slot) => {
                *slot = score;
                "updated"
            }
            None => {
                state.scores.push(score);
                "inserted"
            }
        };
        Ok(ScoreAck {
            msg: msg.to_string(),
        })
    }

    async fn get_score(&self, auth: &AuthContext, course_id: &str) -> Result<Option<Score>, ApiError> {
        self.record("get_score", auth);
        Ok(self
            .state()
            .scores
            .iter()
            .find(|s| s.course_id == course_id && s.user_id == auth.user_id)
            .cloned())
    }
}

// ─── Fake Identity ────────────────────────────────────────────────────────────

/// One account: `EMAIL` / `PASSWORD`, issuing `TOKEN`
#[derive(Default)]
pub struct FakeIdentity;

fn account() -> IdentitySession {
    IdentitySession {
        access_token: Some(TOKEN.to_string()),
        user_id: Some(USER_ID.to_string()),
        email: Some(EMAIL.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_session(
        &self,
        token: Option<&str>,
    ) -> Result<Option<IdentitySession>, ApiError> {
        Ok((token == Some(TOKEN)).then(account))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, ApiError> {
        if email == EMAIL && password == PASSWORD {
            Ok(account())
        } else {
            Err(ApiError::from_status(
                "identity",
                400,
                r#"{"error_description": "Invalid login credentials"}"#,
            ))
        }
    }

    async fn sign_out(&self, _token: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

// ─── Context ──────────────────────────────────────────────────────────────────

/// Session cache over the fakes, optionally holding a valid token already
pub fn session_cache(signed_in: bool) -> Arc<SessionCache> {
    let store = if signed_in {
        MemorySessionStore::with_session(PersistedSession {
            session: Some(TOKEN.to_string()),
            ..PersistedSession::default()
        })
    } else {
        MemorySessionStore::new()
    };

    Arc::new(SessionCache::new(
        Arc::new(FakeIdentity),
        Arc::new(StaticBilling::new("active", Some("cus_1".to_string()))),
        Arc::new(store),
        Arc::new(SystemClock),
        chrono::Duration::seconds(300),
    ))
}

pub fn context(backend: Arc<FakeBackend>, signed_in: bool, downloads_dir: &Path) -> Context {
    Context {
        backend,
        session: session_cache(signed_in),
        downloads_dir: downloads_dir.to_path_buf(),
    }
}
