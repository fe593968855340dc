//! Shared types for the store layer.

pub mod errors;

pub use errors::{ChatError, DatabaseError};

/// Result type for database-level operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Result type for chat store operations
pub type ChatResult<T> = Result<T, ChatError>;
