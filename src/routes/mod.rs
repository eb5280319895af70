//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket quiz sessions at `/ws`
/// - Topic, dashboard and quiz API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/topics", get(http::http_list_topics).post(http::http_create_topic))
        .route("/api/v1/topics/due", get(http::http_due_topics))
        .route("/api/v1/topics/recent", get(http::http_recent_topics))
        .route("/api/v1/topics/:id", get(http::http_get_topic).delete(http::http_delete_topic))
        .route("/api/v1/topics/:id/results", post(http::http_post_result))
        .route("/api/v1/stats", get(http::http_stats))
        .route("/api/v1/quiz", get(http::http_get_quiz))
        .route("/api/v1/quiz/topics", get(http::http_quiz_topics))
        .route("/api/v1/store/reset", post(http::http_reset_store))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::quiz::QuizBank;
    use crate::seeds::builtin_quizzes;
    use crate::storage::MemoryStorage;
    use crate::store::TopicStore;

    fn app_with(storage: MemoryStorage) -> Router {
        let state = AppState::with_store(TopicStore::new(storage), QuizBank::new(builtin_quizzes()));
        build_router(Arc::new(state))
    }

    fn app() -> Router {
        app_with(MemoryStorage::new())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn lists_seeded_topic_with_derived_fields() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/v1/topics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Photosynthesis");
        assert_eq!(body[0]["memoryScore"], 65);
        assert_eq!(body[0]["band"], "average");
        assert_eq!(body[0]["due"], true);
    }

    #[tokio::test]
    async fn create_then_fetch_and_delete_topic() {
        let app = app();
        let (status, created) = send(&app, "POST", "/api/v1/topics", Some(json!({ "name": "Mitosis" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["concepts"].as_array().unwrap().len(), 3);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&app, "GET", &format!("/api/v1/topics/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Mitosis");

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/topics/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/api/v1/topics/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_topic_name_is_rejected() {
        let (status, body) = send(&app(), "POST", "/api/v1/topics", Some(json!({ "name": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("blank"));
    }

    #[tokio::test]
    async fn posted_result_updates_score_and_schedule() {
        let app = app();
        let result = json!({ "score": 100, "correctCount": 5, "totalCount": 5, "weakConcepts": ["c-2"] });
        let (status, _) = send(&app, "POST", "/api/v1/topics/topic-1/results", Some(result.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, topic) = send(&app, "GET", "/api/v1/topics/topic-1", None).await;
        assert_eq!(topic["memoryScore"], 74);
        assert_eq!(topic["totalAttempts"], 4);
        assert_eq!(topic["concepts"][1]["status"], "weak");
        assert_eq!(topic["due"], false);

        // unknown ids are a silent no-op
        let (status, _) = send(&app, "POST", "/api/v1/topics/nope/results", Some(result)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, stats) = send(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(stats["totalTopics"], 1);
        assert_eq!(stats["dueCount"], 0);
    }

    #[tokio::test]
    async fn inconsistent_result_counts_are_rejected() {
        let app = app();
        for bad in [
            json!({ "score": 50, "correctCount": 3, "totalCount": 2 }),
            json!({ "score": 50, "totalCount": 0 }),
            json!({ "score": 50 }),
        ] {
            let (status, body) = send(&app, "POST", "/api/v1/topics/topic-1/results", Some(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].as_str().unwrap().contains("Count"));
        }
        let (_, topic) = send(&app, "GET", "/api/v1/topics/topic-1", None).await;
        assert_eq!(topic["totalAttempts"], 3);
    }

    #[tokio::test]
    async fn quiz_endpoint_resolves_authored_and_focused_sets() {
        let app = app();
        let (status, qs) = send(&app, "GET", "/api/v1/quiz?topicId=topic-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(qs.as_array().unwrap().len(), 5);

        let (_, focused) = send(&app, "GET", "/api/v1/quiz?topicId=topic-1&focusConceptId=c-3", None).await;
        assert_eq!(focused[0]["id"], "ps-5");

        let (status, _) = send(&app, "GET", "/api/v1/quiz?topicId=missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, names) = send(&app, "GET", "/api/v1/quiz/topics", None).await;
        assert_eq!(names["topics"][0], "Photosynthesis");
    }

    #[tokio::test]
    async fn corrupt_store_reports_error_until_reset() {
        let app = app_with(MemoryStorage::with_blob("garbage"));
        let (status, body) = send(&app, "GET", "/api/v1/topics", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("/api/v1/store/reset"));

        let (status, _) = send(&app, "POST", "/api/v1/store/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "GET", "/api/v1/topics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
