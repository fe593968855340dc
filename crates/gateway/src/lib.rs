//! # Helpdesk Gateway Crate
//!
//! External-facing layer of the helpdesk backend: REST endpoints for chat
//! creation, history, assignment and agent login, plus the WebSocket session
//! gateway feeding the realtime router.
//!
//! The gateway stays thin on purpose. It parses and authenticates, then
//! hands everything to the chat core; no business rules live here.

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use axum::{http::Method, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_rest_routes(arc_state.clone()))
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    // Swagger UI is only mounted in debug builds.
    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::health,
                rest::auth::login,
                rest::chat::create_chat,
                rest::chat::get_chat,
                rest::chat::list_chat_messages,
                rest::chat::assign_chat,
                rest::chat::list_chats,
                rest::chat::list_available_chats,
            ),
            components(
                schemas(
                    rest::ErrorResponse,
                    rest::auth::LoginRequest,
                    rest::auth::SessionResponse,
                    rest::auth::AgentResponse,
                    rest::chat::ChatResponse,
                    rest::chat::MessageResponse,
                    rest::chat::CreateChatRequest,
                )
            ),
            tags(
                (name = "Health", description = "Liveness probes"),
                (name = "Auth", description = "Agent authentication"),
                (name = "Chats", description = "Chat lifecycle and history"),
            )
        )]
        struct ApiDoc;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
}
