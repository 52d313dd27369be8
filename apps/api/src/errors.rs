use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::editor::EditError;
use crate::generation::GenerationError;
use crate::storage::{BlobError, StoreError};
use crate::sync::BridgeClosed;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::UnknownSection(_) | EditError::UnknownStep(_) => {
                AppError::NotFound(err.to_string())
            }
            EditError::InvalidValue { .. } => AppError::UnprocessableEntity(err.to_string()),
            EditError::UnknownField { .. }
            | EditError::NotACollection(_)
            | EditError::IsACollection(_)
            | EditError::MismatchedItem { .. } => AppError::Validation(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("Resume {id} not found")),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidInput(msg) => AppError::Validation(msg),
            GenerationError::Llm(e) => AppError::Llm(e.to_string()),
        }
    }
}

impl From<BridgeClosed> for AppError {
    fn from(_: BridgeClosed) -> Self {
        AppError::SessionClosed
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(format!("Invalid multipart body: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::SessionClosed => (
                StatusCode::GONE,
                "SESSION_CLOSED",
                "The editing session has been closed".to_string(),
            ),
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
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SectionKind;

    #[test]
    fn test_unknown_section_is_not_found() {
        let response = AppError::from(EditError::UnknownSection("hobbies".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_edit_shape_errors_are_bad_requests() {
        let err = AppError::from(EditError::IsACollection(SectionKind::Projects));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generation_input_error_keeps_message() {
        let err = AppError::from(GenerationError::InvalidInput(
            "Must be at least 20 characters".to_string(),
        ));
        assert!(matches!(err, AppError::Validation(ref m) if m == "Must be at least 20 characters"));
    }

    #[test]
    fn test_collaborator_failures_are_bad_gateway() {
        let err = AppError::from(BlobError::Upload("timeout".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
