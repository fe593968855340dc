//! REST API endpoints for the gateway

pub mod auth;
pub mod chat;
pub mod health;

use axum::{middleware as axum_middleware, routing::get, routing::post, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::GatewayState;

/// Error payload shape shared by every REST endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Create all REST API routes. Customer-facing routes are public; agent
/// routes sit behind the session-token middleware.
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .route("/chat", post(chat::create_chat))
        .route("/chat/:chat_id/messages", get(chat::list_chat_messages));

    let protected = Router::new()
        .route("/chat/:chat_id", get(chat::get_chat))
        .route("/chat/:chat_id/assign", post(chat::assign_chat))
        .route("/chats", get(chat::list_chats))
        .route("/chats/available", get(chat::list_available_chats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth_middleware,
        ));

    public.merge(protected).with_state(state)
}
