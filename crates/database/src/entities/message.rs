//! Message entity definitions

use serde::{Deserialize, Serialize};

/// A single stored chat message. Immutable once written; the timestamp is
/// assigned by the store at insertion, never taken from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Customer,
    Agent,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Customer => "customer",
            SenderType::Agent => "agent",
        }
    }

    /// Capitalized form used in transcript lines.
    pub fn label(&self) -> &'static str {
        match self {
            SenderType::Customer => "Customer",
            SenderType::Agent => "Agent",
        }
    }
}

impl From<&str> for SenderType {
    fn from(s: &str) -> Self {
        match s {
            "agent" => SenderType::Agent,
            _ => SenderType::Customer,
        }
    }
}

impl std::fmt::Display for SenderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
