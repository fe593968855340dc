//! Error types for the store layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Chat-specific store errors. This is the error taxonomy the lifecycle
/// layer reports to callers; every failing operation leaves no partial
/// writes behind.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat not found")]
    ChatNotFound,

    #[error("Chat is already assigned or not pending")]
    AlreadyAssigned,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ChatError {
    pub fn validation(message: impl Into<String>) -> Self {
        ChatError::ValidationError(message.into())
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(error: sqlx::Error) -> Self {
        ChatError::DatabaseError(error.to_string())
    }
}
