//! HTTP client for the course generation backend

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use super::stream::ChatStream;
use super::types::{
    ChatRequest, Chunk, ContentRequest, CourseContent, CourseInfo, Instructions, Lesson,
    MediaFormat, Score, ScoreAck, ScoreSubmission, SubscriptionStatus, Test,
};
use super::{AuthContext, Backend};
use crate::config::Config;

const SERVICE_NAME: &str = "backend";

/// Backend API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    send_user_id: bool,
    client: Client,
}

impl BackendClient {
    /// Client with default settings: `user_id` parameter on, no timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            send_user_id: true,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        Ok(Self {
            base_url: normalize_base_url(config.backend.base_url.clone()),
            send_user_id: config.backend.send_user_id,
            client,
        })
    }

    /// Toggle the `user_id` query parameter
    pub fn with_user_id_param(mut self, enabled: bool) -> Self {
        self.send_user_id = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, auth: &AuthContext) -> RequestBuilder {
        debug!(%method, path, "backend request");

        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &auth.token {
            builder = builder.bearer_auth(token);
        }
        if self.send_user_id {
            if let Some(user_id) = &auth.user_id {
                builder = builder.query(&[("user_id", user_id)]);
            }
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await?;
            warn!(operation, status = status.as_u16(), "backend request failed");
            return Err(ApiError::from_status(SERVICE_NAME, status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, operation).await?;
        let body = read_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(SERVICE_NAME, format!("{}: {}", operation, e)))
    }

    /// Send a request whose response body only matters when it reports an error
    async fn execute(&self, builder: RequestBuilder, operation: &str) -> Result<(), ApiError> {
        let response = self.send(builder, operation).await?;
        let body = read_body(response).await?;
        reject_error_payload(&body)
    }

    /// `GET /users/user-subscription-status`
    pub async fn subscription_status(
        &self,
        auth: &AuthContext,
    ) -> Result<SubscriptionStatus, ApiError> {
        let builder = self.request(Method::GET, "/users/user-subscription-status", auth);
        self.fetch_json(builder, "subscription_status").await
    }
}

/// A body cut off mid-transfer is a network failure, never an empty success
async fn read_body(response: Response) -> Result<String, ApiError> {
    response
        .text()
        .await
        .map_err(|e| ApiError::network(SERVICE_NAME, format!("Failed to read response: {}", e)))
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Generation routes report failures as `{"error": "..."}` with a 200 status
fn reject_error_payload(body: &str) -> Result<(), ApiError> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        if let Some(serde_json::Value::String(message)) = map.get("error") {
            return Err(ApiError::http(SERVICE_NAME, 200, message.clone()));
        }
    }
    Ok(())
}

#[async_trait]
impl Backend for BackendClient {
    async fn list_courses(&self, auth: &AuthContext) -> Result<Vec<CourseInfo>, ApiError> {
        let builder = self.request(Method::GET, "/course/course-info", auth);
        self.fetch_json(builder, "list_courses").await
    }

    async fn delete_course(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError> {
        let path = format!("/course/delete-course/{}", course_id);
        let builder = self.request(Method::DELETE, &path, auth);
        self.execute(builder, "delete_course").await
    }

    async fn submit_content(&self, auth: &AuthContext, link: &str) -> Result<String, ApiError> {
        let builder = self
            .request(Method::POST, "/generate/content", auth)
            .json(&ContentRequest::upload(link));
        self.fetch_json(builder, "submit_content").await
    }

    async fn generate_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/instruct/generate-instructions/{}", course_id);
        let builder = self
            .request(Method::POST, &path, auth)
            .json(&serde_json::json!({}));
        self.execute(builder, "generate_instructions").await
    }

    async fn get_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<Instructions>, ApiError> {
        let path = format!("/instruct/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        let rows: Vec<Instructions> = self.fetch_json(builder, "get_instructions").await?;
        Ok(rows.into_iter().next())
    }

    async fn save_instructions(
        &self,
        auth: &AuthContext,
        course_id: &str,
        instructions: &Instructions,
    ) -> Result<(), ApiError> {
        let path = format!("/instruct/{}", course_id);
        let builder = self.request(Method::POST, &path, auth).json(instructions);
        self.execute(builder, "save_instructions").await
    }

    async fn get_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<CourseContent>, ApiError> {
        let path = format!("/generate/content/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        let rows: Vec<CourseContent> = self.fetch_json(builder, "get_course_content").await?;
        Ok(rows.into_iter().next())
    }

    async fn update_course_content(
        &self,
        auth: &AuthContext,
        course_id: &str,
        content: &CourseContent,
    ) -> Result<(), ApiError> {
        let path = format!("/generate/update-course/{}", course_id);
        let builder = self.request(Method::PUT, &path, auth).json(content);
        self.execute(builder, "update_course_content").await
    }

    async fn list_chunks(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Vec<Chunk>, ApiError> {
        let path = format!("/chunk/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        self.fetch_json(builder, "list_chunks").await
    }

    async fn update_chunk(&self, auth: &AuthContext, chunk: &Chunk) -> Result<(), ApiError> {
        let path = format!("/chunk/{}", chunk.chunk_id);
        let builder = self.request(Method::PUT, &path, auth).json(chunk);
        self.execute(builder, "update_chunk").await
    }

    async fn delete_chunk(&self, auth: &AuthContext, chunk_id: &str) -> Result<(), ApiError> {
        let path = format!("/chunk/delete-chunks/{}", chunk_id);
        let builder = self.request(Method::DELETE, &path, auth);
        self.execute(builder, "delete_chunk").await
    }

    async fn list_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Vec<Lesson>, ApiError> {
        let path = format!("/lesson/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        self.fetch_json(builder, "list_lessons").await
    }

    async fn update_lesson(&self, auth: &AuthContext, lesson: &Lesson) -> Result<(), ApiError> {
        let path = format!("/lesson/{}", lesson.lesson_id);
        let builder = self.request(Method::PUT, &path, auth).json(lesson);
        self.execute(builder, "update_lesson").await
    }

    async fn delete_lesson(&self, auth: &AuthContext, lesson_id: &str) -> Result<(), ApiError> {
        let path = format!("/lesson/{}", lesson_id);
        let builder = self.request(Method::DELETE, &path, auth);
        self.execute(builder, "delete_lesson").await
    }

    async fn list_tests(&self, auth: &AuthContext, course_id: &str) -> Result<Vec<Test>, ApiError> {
        let path = format!("/test/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        self.fetch_json(builder, "list_tests").await
    }

    async fn update_test(&self, auth: &AuthContext, test: &Test) -> Result<(), ApiError> {
        let path = format!("/test/{}", test.test_id);
        let builder = self.request(Method::PUT, &path, auth).json(test);
        self.execute(builder, "update_test").await
    }

    async fn delete_test(&self, auth: &AuthContext, test_id: &str) -> Result<(), ApiError> {
        let path = format!("/test/{}", test_id);
        let builder = self.request(Method::DELETE, &path, auth);
        self.execute(builder, "delete_test").await
    }

    async fn generate_tests(&self, auth: &AuthContext, course_id: &str) -> Result<(), ApiError> {
        let path = format!("/test/generate-tests/{}", course_id);
        let builder = self.request(Method::POST, &path, auth);
        self.execute(builder, "generate_tests").await
    }

    async fn generate_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/lesson/generate-lessons/{}", course_id);
        let builder = self.request(Method::POST, &path, auth);
        self.execute(builder, "generate_lessons").await
    }

    async fn chat(
        &self,
        auth: &AuthContext,
        request: &ChatRequest,
    ) -> Result<ChatStream, ApiError> {
        let path = format!("/chat/{}/chat", request.course_id);
        let builder = self
            .request(Method::POST, &path, auth)
            .header("Accept", "text/event-stream")
            .json(request);
        let response = self.send(builder, "chat").await?;
        Ok(ChatStream::from_response(response))
    }

    async fn download_lessons(
        &self,
        auth: &AuthContext,
        course_id: &str,
        format: MediaFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let path = format!("/media/{}/{}", format.endpoint(), course_id);
        let builder = self.request(Method::GET, &path, auth);
        let response = self.send(builder, "download_lessons").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(SERVICE_NAME, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn add_score(
        &self,
        auth: &AuthContext,
        submission: &ScoreSubmission,
    ) -> Result<ScoreAck, ApiError> {
        let builder = self
            .request(Method::POST, "/score/add-scores", auth)
            .json(submission);
        self.fetch_json(builder, "add_score").await
    }

    async fn get_score(
        &self,
        auth: &AuthContext,
        course_id: &str,
    ) -> Result<Option<Score>, ApiError> {
        let path = format!("/score/get-scores/{}", course_id);
        let builder = self.request(Method::GET, &path, auth);
        let rows: Vec<Score> = self.fetch_json(builder, "get_score").await?;
        Ok(rows.into_iter().next())
    }
}
