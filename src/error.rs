// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    ai::AiError,
    ingest::{CameraError, IngestionError},
};

/// Fixed user-facing messages.
pub mod messages {
    pub const CONTEXT_REQUIRED: &str = "Vui lòng cung cấp ngữ liệu.";
    pub const STUDENT_SETUP_REQUIRED: &str =
        "Vui lòng cung cấp ngữ liệu, môn học và lớp để bắt đầu.";
    pub const QUESTION_TYPE_REQUIRED: &str = "Vui lòng chọn ít nhất một dạng câu hỏi.";
    pub const ANSWER_REQUIRED: &str = "Vui lòng nhập câu trả lời trước khi nộp bài.";
    pub const EMPTY_TEST: &str =
        "AI không thể tạo bài kiểm tra. Vui lòng thử lại với một chủ đề khác.";
}

/// Errors raised by the teacher and student state machines.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Required user input is missing or out of range.
    #[error("{0}")]
    Validation(String),

    /// The action does not apply in the session's current state.
    #[error("{0}")]
    InvalidState(String),

    /// Another action of the same session is still in flight.
    #[error("Another action is still in progress")]
    Busy,

    /// Generation succeeded but produced no questions.
    #[error("{}", messages::EMPTY_TEST)]
    EmptyResult,

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 403 Forbidden (camera permission)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (wrong state, action already running)
    Conflict(String),

    // 422 Unprocessable Entity (empty test, unreadable upload)
    Unprocessable(String),

    // 502 Bad Gateway (generative model failed)
    BadGateway(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::InvalidRequest(msg) => AppError::BadRequest(msg),
            other => AppError::BadGateway(other.to_string()),
        }
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(msg) => AppError::BadRequest(msg),
            FlowError::InvalidState(msg) => AppError::Conflict(msg),
            FlowError::Busy => AppError::Conflict(err.to_string()),
            FlowError::EmptyResult => AppError::Unprocessable(err.to_string()),
            FlowError::Ai(ai) => ai.into(),
        }
    }
}

impl From<IngestionError> for AppError {
    fn from(err: IngestionError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::Denied { .. } => AppError::Forbidden(err.to_string()),
            CameraError::Capture { .. } => AppError::Unprocessable(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
