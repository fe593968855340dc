//! Realtime message router.

use std::sync::Arc;

use tracing::debug;

use crate::rooms::{RoomRegistry, SessionId};
use crate::services::LifecycleService;
use crate::types::{ClientEvent, ServerEvent};

/// Validates inbound session events and sequences lifecycle calls against
/// room broadcasts: an event is only ever announced to a room after its
/// persistence step committed, and failures go back to the originating
/// session alone.
pub struct MessageRouter {
    lifecycle: Arc<LifecycleService>,
    rooms: Arc<RoomRegistry>,
}

impl MessageRouter {
    pub fn new(lifecycle: Arc<LifecycleService>, rooms: Arc<RoomRegistry>) -> Self {
        Self { lifecycle, rooms }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub async fn handle_event(&self, session: SessionId, event: ClientEvent) {
        match event {
            ClientEvent::Join {
                chat_id,
                user_id,
                user_type: _,
            } => {
                if chat_id.is_empty() || user_id.is_empty() {
                    return self.reject(session, "Invalid join parameters").await;
                }

                self.rooms.join(&chat_id, session).await;
                self.rooms
                    .broadcast(&chat_id, ServerEvent::UserJoined { user_id })
                    .await;
            }
            ClientEvent::SendMessage {
                chat_id,
                sender_id,
                sender_type,
                content,
            } => {
                if chat_id.is_empty() || sender_id.is_empty() || content.is_empty() {
                    return self.reject(session, "Invalid message parameters").await;
                }

                match self
                    .lifecycle
                    .append_message(&chat_id, &sender_id, sender_type, &content)
                    .await
                {
                    Ok(message) => {
                        self.rooms
                            .broadcast(
                                &chat_id,
                                ServerEvent::ReceiveMessage {
                                    message_id: message.id,
                                    sender_id: message.sender_id,
                                    sender_type: message.sender_type,
                                    content: message.content,
                                    timestamp: message.timestamp,
                                },
                            )
                            .await;
                    }
                    Err(error) => self.reject(session, &error.to_string()).await,
                }
            }
            ClientEvent::CloseChat { chat_id, closer_id } => {
                if chat_id.is_empty() || closer_id.is_empty() {
                    return self.reject(session, "Invalid close parameters").await;
                }

                match self.lifecycle.close_chat(&chat_id, &closer_id).await {
                    Ok(_) => {
                        self.rooms
                            .broadcast(
                                &chat_id,
                                ServerEvent::ChatClosed {
                                    chat_id: chat_id.clone(),
                                    closer_id,
                                },
                            )
                            .await;
                    }
                    Err(error) => self.reject(session, &error.to_string()).await,
                }
            }
        }
    }

    /// Called by the session gateway when a connection drops, so room
    /// membership never outlives the session.
    pub async fn disconnect(&self, session: SessionId) {
        self.rooms.unregister(session).await;
    }

    async fn reject(&self, session: SessionId, message: &str) {
        debug!(session, message, "rejected session event");
        self.rooms
            .send_to(
                session,
                ServerEvent::Error {
                    message: message.to_owned(),
                },
            )
            .await;
    }
}
