//! Authentication REST endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::rest::ErrorResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: String,
    pub agent: AgentResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl From<helpdesk_auth::Agent> for AgentResponse {
    fn from(agent: helpdesk_auth::Agent) -> Self {
        Self {
            id: agent.id,
            email: agent.email,
            display_name: agent.display_name,
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 400, description = "Missing credentials", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "email and password are required".to_string(),
        ));
    }

    let (agent, session) = state
        .authenticator()
        .login_with_password(&payload.email, &payload.password)
        .await?;

    Ok(Json(SessionResponse {
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
        agent: agent.into(),
    }))
}
