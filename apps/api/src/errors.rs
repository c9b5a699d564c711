use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::notion::NotionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Enrichment failures (tag vocabulary, AI summary quality) never reach this
/// type: they are logged and degraded inside their modules. Only the
/// mandatory steps surface here, chiefly obtaining page text and writing
/// to the destination store.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No readable content: {0}")]
    NoContent(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Notion API error (status {status}): {message}")]
    Notion { status: u16, message: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<NotionError> for AppError {
    fn from(e: NotionError) -> Self {
        match e {
            NotionError::Api { status, message } => AppError::Notion { status, message },
            NotionError::Http(e) => {
                AppError::Internal(anyhow::anyhow!("Notion request failed: {e}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NoContent(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_CONTENT", msg.clone())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            // The destination store's own message is surfaced verbatim.
            AppError::Notion { status, message } => {
                tracing::error!("Notion API error (status {status}): {message}");
                (StatusCode::BAD_GATEWAY, "NOTION_API_ERROR", message.clone())
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
