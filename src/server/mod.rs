//! HTTP 서버 - Axum 기반 FAQ 엔드포인트
//!
//! - `GET /`            UI 페이지
//! - `POST /ask`        `{"question": ...}` → `{"answer", "confidence"}`
//! - `GET /health`      상태 확인
//! - `GET /api/stats`   지식베이스 통계

mod error;
mod routes;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::knowledge::{KnowledgeStore, Matcher};

pub use error::ApiError;
pub use routes::AskResponse;

/// 서버 기본 호스트
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// 서버 기본 포트
pub const DEFAULT_PORT: u16 = 5000;

// ============================================================================
// State
// ============================================================================

/// 핸들러 공유 상태
///
/// 저장소는 시작 후 읽기 전용이므로 잠금 없이 공유합니다.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<KnowledgeStore>,
    pub matcher: Matcher,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: KnowledgeStore, matcher: Matcher) -> Self {
        Self {
            store: Arc::new(store),
            matcher,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// 라우터 생성
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/ask", post(routes::ask))
        .route("/health", get(routes::health))
        .route("/api/stats", get(routes::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// 서버 시작
pub async fn start(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("FAQ server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("FAQ server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{KnowledgeRecord, FALLBACK_ANSWER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = KnowledgeStore::from_records(vec![
            KnowledgeRecord::new("1", "reset,password", "Go to settings > reset password."),
            KnowledgeRecord::new("2", "guide_code_4521", "Printer offline. Check the cable."),
        ]);
        build_router(AppState::new(store, Matcher::default()))
    }

    async fn post_ask(router: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn test_ask_keyword_match() {
        let (status, json) = post_ask(test_router(), r#"{"question": "How do I reset password"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], "Go to settings > reset password.");
        assert!(json["confidence"].as_f64().unwrap() >= 3.0);
    }

    #[tokio::test]
    async fn test_ask_guide_code() {
        let (status, json) = post_ask(test_router(), r#"{"question": "error code 4521?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], "Printer offline. Check the cable.");
        assert_eq!(json["confidence"].as_f64(), Some(0.95));
    }

    #[tokio::test]
    async fn test_ask_fallback_is_success() {
        let router = build_router(AppState::new(KnowledgeStore::default(), Matcher::default()));
        let (status, json) = post_ask(router, r#"{"question": "anything"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["answer"], FALLBACK_ANSWER);
        assert_eq!(json["confidence"].as_f64(), Some(0.04));
    }

    #[tokio::test]
    async fn test_ask_missing_question() {
        for body in [r#"{}"#, r#"{"question": ""}"#, r#"{"question": "   "}"#] {
            let (status, json) = post_ask(test_router(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "No question provided");
        }
    }

    #[tokio::test]
    async fn test_ask_non_object_body() {
        for body in ["null", r#""hi""#, "[]", "42", r#"{"question": 5}"#] {
            let (status, json) = post_ask(test_router(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body={}", body);
            assert_eq!(json["error"], "No question provided", "body={}", body);
        }
    }

    #[tokio::test]
    async fn test_ask_wrong_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "text/plain")
            .body(Body::from(r#"{"question": "wifi"}"#))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_malformed_json() {
        let (status, json) = post_ask(test_router(), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_index_page() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/ask"));
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = test_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["records"], 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = KnowledgeStore::from_records(vec![
            KnowledgeRecord::new("1", "wifi", "Restart the router."),
            KnowledgeRecord::new("1", "vpn", "Install the client."),
            KnowledgeRecord::new("2", "", "Open a ticket."),
        ]);
        let router = build_router(AppState::new(store, Matcher::default()));

        let request = Request::builder().uri("/api/stats").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["stats"]["record_count"], 3);
        assert_eq!(json["stats"]["keyword_count"], 2);
        assert_eq!(json["stats"]["records_without_keywords"], 1);
        assert_eq!(json["stats"]["duplicate_ids"], serde_json::json!(["1"]));
        assert!(json["stats"]["source"].is_null());
    }
}
