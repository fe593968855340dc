//! Chat entity definitions

use serde::{Deserialize, Serialize};

/// One customer support conversation.
///
/// `agent_id` is populated exactly when the chat has left the `pending`
/// state; the transcript is an append-only human-readable log maintained
/// alongside the structured message rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub customer_name: String,
    pub status: ChatStatus,
    pub agent_id: Option<String>,
    pub transcript: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Pending,
    Active,
    Closed,
}

impl ChatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Pending => "pending",
            ChatStatus::Active => "active",
            ChatStatus::Closed => "closed",
        }
    }
}

impl From<&str> for ChatStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => ChatStatus::Active,
            "closed" => ChatStatus::Closed,
            _ => ChatStatus::Pending,
        }
    }
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
