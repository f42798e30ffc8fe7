use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request-level triage failure (bad payload, missing key). Rendered as the
    /// triage error envelope so webhook senders can correlate by request id.
    #[error("Triage request {request_id} failed: {message}")]
    Triage { request_id: String, message: String },

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Triage {
                request_id,
                message,
            } => {
                tracing::error!("Triage request {request_id} failed: {message}");
                let body = Json(json!({
                    "status": "error",
                    "requestId": request_id,
                    "error": message,
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::RateLimited { retry_after } => {
                let body = Json(json!({
                    "error": "Too many requests, please retry later",
                    "retryAfter": retry_after,
                }));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after.to_string())],
                    body,
                )
                    .into_response()
            }
            AppError::NotFound(msg) => error_envelope(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                error_envelope(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

fn error_envelope(status: StatusCode, code: &str, message: String) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message
        }
    }));

    (status, body).into_response()
}
