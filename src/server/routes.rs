//! HTTP 핸들러

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use super::AppState;

/// 정적 UI 페이지
const INDEX_HTML: &str = include_str!("../../static/index.html");

// ============================================================================
// Types
// ============================================================================

/// POST /ask 응답 본문
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub confidence: f64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - UI 페이지
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /ask - 질문에 대한 응답
///
/// JSON 문법 오류나 Content-Type 불일치만 InvalidBody로 처리하고,
/// 객체가 아니거나 question이 문자열이 아닌 본문은 질문 없음으로 취급합니다.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let question = extract_question(&body);
    if question.is_empty() {
        return Err(ApiError::MissingQuestion);
    }

    let result = state.matcher.answer(question, &state.store);
    tracing::info!(
        "ask: method={:?} record={} confidence={:.4}",
        result.method,
        result.record_id.as_deref().unwrap_or("-"),
        result.confidence
    );

    Ok(Json(AskResponse {
        answer: result.answer,
        confidence: round_confidence(result.confidence),
    }))
}

/// GET /health - 상태 확인
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "records": state.store.len(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// GET /api/stats - 지식베이스 통계
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "stats": state.store.stats(),
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 본문에서 trim 된 question 추출 (없거나 문자열이 아니면 빈 문자열)
fn extract_question(body: &Value) -> &str {
    body.get("question")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
}

/// 표시용 신뢰도 (소수점 3자리)
fn round_confidence(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_question() {
        assert_eq!(extract_question(&serde_json::json!({"question": "  hi "})), "hi");
        assert_eq!(extract_question(&serde_json::json!({"question": 5})), "");
        assert_eq!(extract_question(&serde_json::json!({})), "");
        assert_eq!(extract_question(&Value::Null), "");
        assert_eq!(extract_question(&serde_json::json!("hi")), "");
        assert_eq!(extract_question(&serde_json::json!([])), "");
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.95), 0.95);
        assert_eq!(round_confidence(0.04), 0.04);
        assert_eq!(round_confidence(3.571428), 3.571);
        assert_eq!(round_confidence(0.0), 0.0);
    }
}
