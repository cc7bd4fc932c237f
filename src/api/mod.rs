//! Clients for the services elevan talks to.
//!
//! - `client`: the course generation backend (courses, chunks, lessons,
//!   tests, chat, media, scores)
//! - `stream`: decoding of the streamed chat reply
//! - `error`: the shared error taxonomy

use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::BackendClient;
pub use error::ApiError;
pub use stream::{ChatEvent, ChatEventDecoder, ChatStream};
pub use types::{
    ChatRequest, Chunk, CourseContent, CourseInfo, Instructions, Lesson, MediaFormat, Score,
    ScoreAck, ScoreSubmission, SubscriptionStatus, Test,
};

/// Caller identity attached to backend requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// Sent as `Authorization: Bearer` when present
    pub token: Option<String>,
    /// Sent as the `user_id` query parameter when present
    pub user_id: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_id: Some(user_id.into()),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some() && self.user_id.is_some()
    }
}

/// Operations offered by the course generation backend.
///
/// `BackendClient` is the HTTP implementation; screens and tests only see
/// this trait.
#[async_trait]
pub trait Backend: Send + Sync {
    // Courses
    async fn list_courses(&self, auth: &AuthContext) -> Result<Vec<CourseInfo>, ApiError>;
    async fn delete_course(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError>;

    /// Submit a source link; returns the new course id
    async fn submit_content(&self, auth: &AuthContext, link: &str) -> Result<String, ApiError>;

    // Instructions
    async fn generate_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<(), ApiError>;
    async fn get_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<Instructions>, ApiError>;
    async fn save_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
        instructions: &Instructions,
    ) -> Result<(), ApiError>;

    // Reviewed content
    async fn get_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<CourseContent>, ApiError>;
    async fn update_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
        content: &CourseContent,
    ) -> Result<(), ApiError>;

    // Chunks
    async fn list_chunks(&self, auth: &AuthContext, course_id: &str)
        -> Result<Vec<Chunk>, ApiError>;
    async fn update_chunk(&self, auth: &AuthContext, chunk: &Chunk) -> Result<(), ApiError>;
    async fn delete_chunk(&self, auth: &AuthContext, chunk_id: &str) -> Result<(), ApiError>;

    // Lessons
    async fn list_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Vec<Lesson>, ApiError>;
    async fn update_lesson(&self, auth: &AuthContext, lesson: &Lesson) -> Result<(), ApiError>;
    async fn delete_lesson(&self, auth: &AuthContext, lesson_id: &str) -> Result<(), ApiError>;

    // Tests
    async fn list_tests(&self, auth: &AuthContext, course_id: &str) -> Result<Vec<Test>, ApiError>;
    async fn update_test(&self, auth: &AuthContext, test: &Test) -> Result<(), ApiError>;
    async fn delete_test(&self, auth: &AuthContext, test_id: &str) -> Result<(), ApiError>;

    // Generation triggers
    async fn generate_tests(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError>;
    async fn generate_lessons(&self, auth: &AuthContext, course_id: &str)
        -> Result<(), ApiError>;

    /// Ask the course assistant; the reply is streamed
    async fn chat(&self, auth: &AuthContext, request: &ChatRequest)
        -> Result<ChatStream, ApiError>;

    /// Download the lesson deck as raw bytes
    async fn download_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
        format: MediaFormat,
    ) -> Result<Vec<u8>, ApiError>;

    // Scores
    async fn add_score(
        &self,
        auth: &AuthContext,
        submission: &ScoreSubmission,
    ) -> Result<ScoreAck, ApiError>;
    async fn get_score(&self, auth: &AuthContext, course_id: &str)
        -> Result<Option<Score>, ApiError>;
}
