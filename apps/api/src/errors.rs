use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request input failed its schema contract.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Submission attempted before both the text and audio answer exist.
    #[error("Incomplete answer: {0}")]
    IncompleteAnswer(String),

    /// The session or recorder is not in a state that allows the action.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A recording outgrew its byte budget.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Microphone access denied: {0}")]
    MediaAccess(String),

    /// Provider call failed or returned output that did not match the schema.
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::IncompleteAnswer(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INCOMPLETE_ANSWER",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::MediaAccess(msg) => {
                tracing::warn!("Media access error: {msg}");
                (
                    StatusCode::FORBIDDEN,
                    "MEDIA_ACCESS_DENIED",
                    "Microphone access denied. Please allow access in your browser settings."
                        .to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred. Please try again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
