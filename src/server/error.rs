//! HTTP 에러 응답

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// API 에러 (`{"error": ...}` 본문으로 직렬화)
#[derive(Debug, Error)]
pub enum ApiError {
    /// question 필드가 없거나 비어 있음
    #[error("No question provided")]
    MissingQuestion,
    /// JSON 본문 파싱 실패
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingQuestion | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!("Client error: {}", self);
        let payload = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(payload)).into_response()
    }
}
