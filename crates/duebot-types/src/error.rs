use thiserror::Error;

use crate::category::CategoryId;

/// Errors related to task operations.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found")]
    NotFound,

    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("due_date must be in the future")]
    DueDateInPast,

    #[error("category {0} does not belong to the user")]
    ForeignCategory(CategoryId),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("invalid category name: {0}")]
    InvalidCategoryName(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to category operations.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category not found")]
    NotFound,

    #[error("invalid category name: {0}")]
    InvalidName(String),

    #[error("category '{0}' already exists")]
    NameConflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from the header authentication shim and chat registration.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("missing Telegram user id")]
    MissingExternalId,

    #[error("invalid Telegram user id: '{0}'")]
    InvalidExternalId(String),

    #[error("telegram_chat_id is required")]
    MissingChatId,

    #[error("chat {0} is already bound to another account")]
    ChatAlreadyBound(i64),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from delivering a message through the messaging API.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("messenger not configured (missing bot token)")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("messenger rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Errors from repository operations (used by trait definitions in duebot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
