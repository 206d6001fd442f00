//! HTTP API for the course assistant.
//!
//! Routes:
//! - `POST /api/query` answer a question within a session
//! - `GET /api/courses` catalog statistics
//! - `DELETE /api/session/{session_id}` clear a session's history
//! - `GET /api/health` liveness check
//!
//! An optional static directory is served for every other path.

use crate::agent::Source;
use crate::rag::RagSystem;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Build the API router around a shared RAG system.
pub fn router(rag: Arc<RagSystem>, static_dir: Option<&std::path::Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .route("/api/session/{session_id}", delete(clear_session))
        .route("/api/health", get(health));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(rag)
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<Source>,
    session_id: String,
}

#[derive(Debug, Serialize)]
struct CourseStats {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SessionCleared {
    status: &'static str,
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Course materials assistant is running"
    }))
}

async fn query(State(rag): State<Arc<RagSystem>>, Json(req): Json<QueryRequest>) -> Response {
    let session_id = match req.session_id {
        Some(id) => id,
        None => match rag.sessions().create_session() {
            Ok(id) => id,
            Err(e) => return internal_error(e),
        },
    };

    match rag.query(&req.query, Some(&session_id)).await {
        Ok(response) => Json(QueryResponse {
            answer: response.answer,
            sources: response.sources,
            session_id,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn courses(State(rag): State<Arc<RagSystem>>) -> Response {
    match rag.course_analytics().await {
        Ok(analytics) => Json(CourseStats {
            total_courses: analytics.total_courses,
            course_titles: analytics.course_titles,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn clear_session(
    State(rag): State<Arc<RagSystem>>,
    Path(session_id): Path<String>,
) -> Response {
    match rag.sessions().clear_session(&session_id) {
        Ok(()) => Json(SessionCleared {
            status: "cleared",
            session_id,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{tool_use, ScriptedModel};
    use crate::config::{Prompts, Settings};
    use crate::llm::MessageResponse;
    use crate::vector_store::{sample_store, VectorStore};
    use serde_json::{json, Value};

    async fn spawn(script: Vec<MessageResponse>, static_dir: Option<&std::path::Path>) -> String {
        let store: Arc<dyn VectorStore> = Arc::new(sample_store().await);
        let rag = RagSystem::with_components(
            &Settings::default(),
            Prompts::default(),
            Arc::new(ScriptedModel::new(script)),
            store,
        )
        .unwrap();
        let app = router(Arc::new(rag), static_dir);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn(Vec::new(), None).await;

        let body: Value = reqwest::get(format!("{}/api/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], json!("ok"));
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_courses() {
        let base = spawn(Vec::new(), None).await;

        let body: Value = reqwest::get(format!("{}/api/courses", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["total_courses"], json!(2));
        assert_eq!(body["course_titles"].as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn test_query_creates_session_and_returns_sources() {
        let base = spawn(
            vec![
                tool_use(&[(
                    "t1",
                    "search_course_content",
                    json!({"query": "machine learning", "course_name": "fundamentals", "lesson_number": 1}),
                )]),
                MessageResponse::from_text("Machine learning is a subset of AI."),
                MessageResponse::from_text("Glad to help."),
            ],
            None,
        )
        .await;
        let client = reqwest::Client::new();

        let body: Value = client
            .post(format!("{}/api/query", base))
            .json(&json!({"query": "What is machine learning?"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["answer"], json!("Machine learning is a subset of AI."));
        assert_eq!(body["session_id"], json!("session_1"));
        assert_eq!(
            body["sources"],
            json!([{"text": "AI Fundamentals - Lesson 1", "link": "https://example.com/lesson/1"}])
        );

        let body: Value = client
            .post(format!("{}/api/query", base))
            .json(&json!({"query": "Thanks", "session_id": "session_1"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["session_id"], json!("session_1"));
        assert_eq!(body["sources"], json!([]));
    }

    #[tokio::test]
    async fn test_query_failure_is_500_with_detail() {
        let base = spawn(Vec::new(), None).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/query", base))
            .json(&json!({"query": "anything"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_query_requires_query_field() {
        let base = spawn(Vec::new(), None).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/query", base))
            .json(&json!({"session_id": "session_1"}))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_clear_session() {
        let base = spawn(Vec::new(), None).await;

        let response = reqwest::Client::new()
            .delete(format!("{}/api/session/session_7", base))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"status": "cleared", "session_id": "session_7"}));
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Course Assistant</h1>").unwrap();
        let base = spawn(Vec::new(), Some(dir.path())).await;

        let text = reqwest::get(format!("{}/", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("Course Assistant"));

        let missing = reqwest::get(format!("{}/api/nothing-here", base)).await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }
}
