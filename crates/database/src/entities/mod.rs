//! Entity definitions for the helpdesk store.

pub mod chat;
pub mod message;

pub use chat::{Chat, ChatStatus};
pub use message::{ChatMessage, SenderType};
