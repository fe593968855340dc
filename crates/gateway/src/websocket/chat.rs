//! Chat WebSocket handler: the realtime session gateway.
//!
//! Each connection gets a session handle in the room registry and a bounded
//! outbound channel drained by a forwarding task. Inbound frames are parsed
//! into typed client events at this boundary; anything that does not parse
//! is answered with an `error` event on this session only.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use helpdesk_chats::{ClientEvent, ServerEvent, SESSION_CHANNEL_CAPACITY};

use crate::state::GatewayState;

pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state))
}

async fn handle_chat_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut ws_sender, mut receiver) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(SESSION_CHANNEL_CAPACITY);
    let session = state.rooms().register(out_tx).await;

    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(error) => {
                    warn!(%error, "failed to serialize server event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    info!(session, "websocket session connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => state.router().handle_event(session, event).await,
                Err(error) => {
                    debug!(session, %error, "unparseable client event");
                    state
                        .rooms()
                        .send_to(
                            session,
                            ServerEvent::Error {
                                message: "Invalid event format".to_string(),
                            },
                        )
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(error) => {
                debug!(session, %error, "websocket receive error");
                break;
            }
            // Ping/pong are handled by axum, binary frames are ignored.
            _ => {}
        }
    }

    state.router().disconnect(session).await;
    sender_task.abort();

    info!(session, "websocket session ended");
}
