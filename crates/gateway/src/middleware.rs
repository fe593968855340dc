//! Middleware for authentication and other cross-cutting concerns

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// Authentication middleware validating agent session tokens.
///
/// Accepts the token from the `Authorization: Bearer` header or, for
/// clients that cannot set headers, a `token` query parameter. The resolved
/// agent identity is stored in the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string());

    let query_token = request.uri().query().and_then(|query| {
        urlencoding::decode(query).ok().and_then(|decoded| {
            decoded.split('&').find_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some("token"), Some(value)) => Some(value.to_string()),
                    _ => None,
                }
            })
        })
    });

    let token = auth_header.or(query_token).ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing authentication token".to_string())
    })?;

    let (agent, _session) = state.authenticator().authenticate_token(&token).await?;

    request.extensions_mut().insert(agent);

    Ok(next.run(request).await)
}

/// Extract the authenticated agent placed in the extensions by
/// [`auth_middleware`].
pub fn extract_agent(request: &Request) -> GatewayResult<helpdesk_auth::Agent> {
    request
        .extensions()
        .get::<helpdesk_auth::Agent>()
        .cloned()
        .ok_or_else(|| GatewayError::AuthenticationFailed("Agent not authenticated".to_string()))
}

/// Request/response logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> impl IntoResponse {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "request completed"
    );

    response
}
