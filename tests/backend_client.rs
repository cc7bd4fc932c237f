//! `BackendClient` against a local axum server standing in for the backend.
//!
//! Each test binds its own server on an ephemeral port, so they can run in
//! parallel.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use elevan::api::{
    ApiError, AuthContext, Backend, BackendClient, ChatRequest, MediaFormat, ScoreSubmission,
};

// ─── Mock Server ──────────────────────────────────────────────────────────────

/// Echoes the identity it saw back as a course
async fn course_info(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!([{
        "course_id": "c1",
        "author_id": params.get("user_id").cloned().unwrap_or_default(),
        "name": null,
        "source": bearer,
        "total_questions": 3
    }]))
}

async fn chat(Path(course_id): Path<String>, Json(body): Json<Value>) -> impl IntoResponse {
    let reply = format!(
        "data: course {}\n\ndata: , you asked {}\n\ndata: [DONE]\n\ndata: ignored\n\n",
        course_id, body["message"].as_str().unwrap_or("")
    );
    ([(header::CONTENT_TYPE, "text/event-stream")], reply)
}

async fn add_scores(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if params.contains_key("user_id") {
        (StatusCode::OK, Json(json!({"msg": "inserted"})))
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"msg": "field required"}]})),
        )
    }
}

async fn delete_chunk() -> Json<Value> {
    Json(json!({"error": "No chunks found for this course"}))
}

async fn missing_course() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Course not found"})))
}

async fn deck(Path(course_id): Path<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        format!("%PDF {}", course_id).into_bytes(),
    )
}

/// Starts a body, then drops the connection before it is complete
async fn truncated() -> Body {
    let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
        Ok("{\"msg\": "),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "gone")),
    ];
    Body::from_stream(futures_util::stream::iter(chunks))
}

async fn no_rows() -> Json<Value> {
    Json(json!([]))
}

async fn spawn_backend() -> BackendClient {
    let app = Router::new()
        .route("/course/course-info", get(course_info))
        .route("/chat/:course_id/chat", post(chat))
        .route("/score/add-scores", post(add_scores))
        .route("/chunk/delete-chunks/:chunk_id", delete(delete_chunk))
        .route("/course/delete-course/:course_id", delete(missing_course))
        .route("/media/lessons-pdf/:course_id", get(deck))
        .route("/test/:test_id", delete(truncated))
        .route("/instruct/:course_id", get(no_rows))
        .route("/score/get-scores/:course_id", get(no_rows));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    BackendClient::new(format!("http://{}/", addr))
}

fn signed_in() -> AuthContext {
    AuthContext::new("tok-1", "u1")
}

// ─── Requests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_identity_sent_as_bearer_and_query() {
    let client = spawn_backend().await;

    let courses = client.list_courses(&signed_in()).await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].author_id, "u1");
    assert_eq!(courses[0].source, "Bearer tok-1");
    // null names decode as empty
    assert_eq!(courses[0].name, "");
}

#[tokio::test]
async fn test_user_id_param_can_be_turned_off() {
    let client = spawn_backend().await.with_user_id_param(false);

    let courses = client.list_courses(&signed_in()).await.unwrap();
    assert_eq!(courses[0].author_id, "");
    assert_eq!(courses[0].source, "Bearer tok-1");
}

#[tokio::test]
async fn test_empty_rows_mean_nothing_stored() {
    let client = spawn_backend().await;

    assert_eq!(client.get_instructions(&signed_in(), "c1").await.unwrap(), None);
    assert_eq!(client.get_score(&signed_in(), "c1").await.unwrap(), None);
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_user_id_is_unprocessable() {
    let client = spawn_backend().await;
    let submission = ScoreSubmission {
        course_id: "c1".to_string(),
        correct_score: 1,
        incorrect_score: 1,
    };

    let err = client
        .add_score(&AuthContext::anonymous(), &submission)
        .await
        .unwrap_err();
    assert!(err.is_unprocessable());

    let ack = client.add_score(&signed_in(), &submission).await.unwrap();
    assert_eq!(ack.msg, "inserted");
}

#[tokio::test]
async fn test_error_payload_with_ok_status_fails() {
    let client = spawn_backend().await;

    let err = client.delete_chunk(&signed_in(), "k1").await.unwrap_err();
    assert_eq!(err.status(), Some(200));
    assert!(err.to_string().contains("No chunks found for this course"));
}

#[tokio::test]
async fn test_not_found_maps_to_status() {
    let client = spawn_backend().await;

    let err = client.delete_course(&signed_in(), "gone").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
}

#[tokio::test]
async fn test_truncated_body_is_a_network_error() {
    let client = spawn_backend().await;

    let err = client.delete_test(&signed_in(), "t1").await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError { .. }));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(format!("http://{}", addr));
    let err = client.list_courses(&signed_in()).await.unwrap_err();
    assert!(matches!(err, ApiError::NetworkError { .. }));
}

// ─── Streaming and media ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_reply_stops_at_sentinel() {
    let client = spawn_backend().await;
    let request = ChatRequest {
        course_id: "c1".to_string(),
        message: "why".to_string(),
        user_id: "u1".to_string(),
    };

    let mut stream = client.chat(&signed_in(), &request).await.unwrap();
    let mut reply = String::new();
    while let Some(delta) = stream.next_delta().await {
        reply.push_str(&delta.unwrap());
    }
    assert_eq!(reply, "course c1, you asked why");
}

#[tokio::test]
async fn test_deck_download_returns_raw_bytes() {
    let client = spawn_backend().await;

    let bytes = client
        .download_lessons(&signed_in(), "c1", MediaFormat::Pdf)
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF c1");
}
