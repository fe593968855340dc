//! Chat REST endpoints
//!
//! Customers create chats and read history without credentials; everything
//! an agent does (claiming, listing, inspecting) requires a session token.

use axum::{
    extract::{Path, Query, Request, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::extract_agent;
use crate::rest::ErrorResponse;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub id: String,
    pub customer_name: String,
    pub status: String,
    pub agent_id: Option<String>,
    pub transcript: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_type: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChatRequest {
    pub name: String,
    pub initial_message: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListChatsQuery {
    /// One of `pending`, `active`, `closed` or `all` (the default).
    pub status: Option<String>,
}

impl From<helpdesk_database::Chat> for ChatResponse {
    fn from(chat: helpdesk_database::Chat) -> Self {
        Self {
            id: chat.id,
            customer_name: chat.customer_name,
            status: chat.status.as_str().to_string(),
            agent_id: chat.agent_id,
            transcript: chat.transcript,
            created_at: chat.created_at,
        }
    }
}

impl From<helpdesk_database::ChatMessage> for MessageResponse {
    fn from(message: helpdesk_database::ChatMessage) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            sender_type: message.sender_type.as_str().to_string(),
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

#[utoipa::path(
    post,
    path = "/chat",
    tag = "Chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "Chat created", body = ChatResponse),
        (status = 400, description = "Missing customer name", body = ErrorResponse)
    )
)]
pub async fn create_chat(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<CreateChatRequest>,
) -> GatewayResult<impl IntoResponse> {
    let chat = state
        .lifecycle()
        .create_chat(&payload.name, payload.initial_message.as_deref())
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(ChatResponse::from(chat))))
}

#[utoipa::path(
    get,
    path = "/chat/{chat_id}",
    tag = "Chats",
    params(("chat_id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Chat details", body = ChatResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    )
)]
pub async fn get_chat(
    Path(chat_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> GatewayResult<Json<ChatResponse>> {
    extract_agent(&request)?;

    let chat = state.lifecycle().get_chat(&chat_id).await?;
    Ok(Json(chat.into()))
}

#[utoipa::path(
    get,
    path = "/chat/{chat_id}/messages",
    tag = "Chats",
    params(("chat_id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Messages ordered by timestamp", body = Vec<MessageResponse>)
    )
)]
pub async fn list_chat_messages(
    Path(chat_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let messages = state.lifecycle().list_messages(&chat_id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/chat/{chat_id}/assign",
    tag = "Chats",
    params(("chat_id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Chat claimed by the calling agent", body = ChatResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse),
        (status = 409, description = "Chat already assigned", body = ErrorResponse)
    )
)]
pub async fn assign_chat(
    Path(chat_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> GatewayResult<Json<ChatResponse>> {
    let agent = extract_agent(&request)?;

    let chat = state.lifecycle().assign_agent(&chat_id, &agent.id).await?;
    Ok(Json(chat.into()))
}

#[utoipa::path(
    get,
    path = "/chats",
    tag = "Chats",
    params(ListChatsQuery),
    responses(
        (status = 200, description = "The calling agent's chats", body = Vec<ChatResponse>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_chats(
    Query(params): Query<ListChatsQuery>,
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> GatewayResult<Json<Vec<ChatResponse>>> {
    let agent = extract_agent(&request)?;

    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some("pending") => Some(helpdesk_database::ChatStatus::Pending),
        Some("active") => Some(helpdesk_database::ChatStatus::Active),
        Some("closed") => Some(helpdesk_database::ChatStatus::Closed),
        Some(other) => {
            return Err(GatewayError::InvalidRequest(format!(
                "unknown status filter: {other}"
            )))
        }
    };

    let chats = state.lifecycle().list_chats(&agent.id, status).await?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/chats/available",
    tag = "Chats",
    responses(
        (status = 200, description = "Pending chats no agent has claimed", body = Vec<ChatResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_available_chats(
    State(state): State<Arc<GatewayState>>,
    request: Request,
) -> GatewayResult<Json<Vec<ChatResponse>>> {
    extract_agent(&request)?;

    let chats = state.lifecycle().list_available().await?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}
