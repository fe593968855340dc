//! Realtime event types.
//!
//! Inbound payloads deserialize into tagged variants; a payload that does
//! not match one of these shapes never reaches the router.

use helpdesk_database::SenderType;
use serde::{Deserialize, Serialize};

/// Events received from a connected session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Enter a chat's room to start receiving its events.
    Join {
        chat_id: String,
        user_id: String,
        user_type: SenderType,
    },
    /// Send a message into a chat.
    SendMessage {
        chat_id: String,
        sender_id: String,
        sender_type: SenderType,
        content: String,
    },
    /// Close a chat.
    CloseChat { chat_id: String, closer_id: String },
}

/// Events delivered to connected sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    UserJoined {
        user_id: String,
    },
    ReceiveMessage {
        message_id: String,
        sender_id: String,
        sender_type: SenderType,
        content: String,
        timestamp: String,
    },
    ChatClosed {
        chat_id: String,
        closer_id: String,
    },
    Error {
        message: String,
    },
}
