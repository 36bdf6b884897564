//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use duebot_types::error::{AccountError, CategoryError, TaskError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Task(TaskError),
    Category(CategoryError),
    Account(AccountError),
    /// Request body could not be read as the expected JSON.
    BadRequest(String),
}

impl From<TaskError> for AppError {
    fn from(e: TaskError) -> Self {
        AppError::Task(e)
    }
}

impl From<CategoryError> for AppError {
    fn from(e: CategoryError) -> Self {
        AppError::Category(e)
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        AppError::Account(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Task(TaskError::NotFound) => {
                (StatusCode::NOT_FOUND, "TASK_NOT_FOUND", "Task not found".to_string())
            }
            AppError::Task(TaskError::StorageError(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg.clone())
            }
            AppError::Task(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),

            AppError::Category(CategoryError::NotFound) => (
                StatusCode::NOT_FOUND,
                "CATEGORY_NOT_FOUND",
                "Category not found".to_string(),
            ),
            AppError::Category(e @ CategoryError::NameConflict(_)) => {
                (StatusCode::CONFLICT, "CATEGORY_CONFLICT", e.to_string())
            }
            AppError::Category(CategoryError::InvalidName(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Category(CategoryError::StorageError(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg.clone())
            }

            AppError::Account(
                e @ (AccountError::MissingExternalId | AccountError::InvalidExternalId(_)),
            ) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()),
            AppError::Account(e @ AccountError::MissingChatId) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Account(e @ AccountError::ChatAlreadyBound(_)) => {
                (StatusCode::CONFLICT, "CHAT_CONFLICT", e.to_string())
            }
            AppError::Account(AccountError::StorageError(msg)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", msg.clone())
            }

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }
        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        (status, Json(body)).into_response()
    }
}
