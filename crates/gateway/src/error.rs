//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<helpdesk_database::ChatError> for GatewayError {
    fn from(error: helpdesk_database::ChatError) -> Self {
        use helpdesk_database::ChatError;

        match error {
            ChatError::ChatNotFound => GatewayError::NotFound("Chat not found".to_string()),
            // Non-fatal business conflict: the agent's available-chats view
            // is stale and should be refreshed.
            ChatError::AlreadyAssigned => {
                GatewayError::Conflict("Chat is already assigned or not pending".to_string())
            }
            ChatError::ValidationError(msg) => GatewayError::InvalidRequest(msg),
            ChatError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<helpdesk_auth::AuthError> for GatewayError {
    fn from(error: helpdesk_auth::AuthError) -> Self {
        use helpdesk_auth::AuthError;

        match error {
            AuthError::AgentExists => GatewayError::Conflict("Agent already exists".to_string()),
            AuthError::InvalidCredentials => {
                GatewayError::AuthenticationFailed("Invalid credentials".to_string())
            }
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::InvalidSession => {
                GatewayError::AuthenticationFailed("Invalid session token".to_string())
            }
            AuthError::Database(e) => GatewayError::DatabaseError(e.to_string()),
            AuthError::PasswordHash(e) => GatewayError::InternalError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("JSON serialization error: {}", error))
    }
}
