//! Repository for message data access operations.

use crate::entities::{ChatMessage, ChatStatus, SenderType};
use crate::types::{ChatError, ChatResult};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

/// Repository for message rows. The append operation keeps the structured
/// message table and the chat's human-readable transcript in lockstep: both
/// writes share one transaction.
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a message and append its transcript line atomically.
    ///
    /// The timestamp is assigned here, clamped so it never falls behind the
    /// chat's latest stored message. Fails without side effects when the
    /// chat is missing or already closed.
    pub async fn append(
        &self,
        chat_id: &str,
        sender_id: &str,
        sender_type: SenderType,
        content: &str,
    ) -> ChatResult<ChatMessage> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM chats WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Err(ChatError::ChatNotFound);
        };

        let status: String = row.try_get("status")?;
        if ChatStatus::from(status.as_str()) == ChatStatus::Closed {
            return Err(ChatError::validation("chat is closed"));
        }

        let mut timestamp = Utc::now();
        let last: Option<String> =
            sqlx::query_scalar("SELECT MAX(timestamp) FROM messages WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_one(&mut *tx)
                .await?;

        if let Some(last) = last {
            if let Ok(last) = DateTime::parse_from_rfc3339(&last) {
                let last = last.with_timezone(&Utc);
                if timestamp < last {
                    timestamp = last;
                }
            }
        }
        let timestamp = timestamp.to_rfc3339();

        let message_id = cuid2::create_id();
        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender_id, sender_type, content, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message_id)
        .bind(chat_id)
        .bind(sender_id)
        .bind(sender_type.as_str())
        .bind(content)
        .bind(&timestamp)
        .execute(&mut *tx)
        .await?;

        let line = format!("{} - {}: {}\n", timestamp, sender_type.label(), content);
        sqlx::query("UPDATE chats SET transcript = transcript || ? WHERE id = ?")
            .bind(&line)
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ChatMessage {
            id: message_id,
            chat_id: chat_id.to_owned(),
            sender_id: sender_id.to_owned(),
            sender_type,
            content: content.to_owned(),
            timestamp,
        })
    }

    /// All messages of a chat, oldest first.
    pub async fn list_for_chat(&self, chat_id: &str) -> ChatResult<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT id, chat_id, sender_id, sender_type, content, timestamp
             FROM messages WHERE chat_id = ?
             ORDER BY timestamp ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }
}

fn row_to_message(row: &SqliteRow) -> ChatResult<ChatMessage> {
    let sender_type: String = row.try_get("sender_type")?;

    Ok(ChatMessage {
        id: row.try_get("id")?,
        chat_id: row.try_get("chat_id")?,
        sender_id: row.try_get("sender_id")?,
        sender_type: SenderType::from(sender_type.as_str()),
        content: row.try_get("content")?,
        timestamp: row.try_get("timestamp")?,
    })
}
