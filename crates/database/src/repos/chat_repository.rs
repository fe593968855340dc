//! Repository for chat data access operations.

use crate::entities::{Chat, ChatStatus, SenderType};
use crate::types::ChatResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for chat rows. Multi-step logical operations run in a single
/// transaction; the claim operation is a lone conditional update whose
/// affected-row count arbitrates the assignment race.
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new pending chat, optionally seeding it with the customer's
    /// first message. The chat insert, the message insert and the transcript
    /// write all commit together or not at all.
    pub async fn create(
        &self,
        customer_name: &str,
        initial_message: Option<&str>,
    ) -> ChatResult<Chat> {
        let chat_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO chats (id, customer_name, status, transcript, created_at)
             VALUES (?, ?, ?, '', ?)",
        )
        .bind(&chat_id)
        .bind(customer_name)
        .bind(ChatStatus::Pending.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let mut transcript = String::new();
        if let Some(content) = initial_message {
            let message_id = cuid2::create_id();
            sqlx::query(
                "INSERT INTO messages (id, chat_id, sender_id, sender_type, content, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&message_id)
            .bind(&chat_id)
            // The customer has no account; the chat id doubles as their
            // sender identity.
            .bind(&chat_id)
            .bind(SenderType::Customer.as_str())
            .bind(content)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            transcript = format!("Initial Message: {content}\n");
            sqlx::query("UPDATE chats SET transcript = ? WHERE id = ?")
                .bind(&transcript)
                .bind(&chat_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(chat_id = %chat_id, customer_name = %customer_name, "created chat");

        Ok(Chat {
            id: chat_id,
            customer_name: customer_name.to_owned(),
            status: ChatStatus::Pending,
            agent_id: None,
            transcript,
            created_at: now,
        })
    }

    pub async fn find_by_id(&self, chat_id: &str) -> ChatResult<Option<Chat>> {
        let row = sqlx::query(
            "SELECT id, customer_name, status, agent_id, transcript, created_at
             FROM chats WHERE id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_chat).transpose()
    }

    /// Atomically claim a pending, unassigned chat for an agent.
    ///
    /// Returns the number of affected rows: 1 means this caller won the
    /// claim, 0 means the chat either does not exist or was not claimable.
    /// The filter on status and agent_id makes the update itself the
    /// arbiter under concurrent claims; callers must not pre-check.
    pub async fn claim_for_agent(&self, chat_id: &str, agent_id: &str) -> ChatResult<u64> {
        let result = sqlx::query(
            "UPDATE chats SET status = 'active', agent_id = ?
             WHERE id = ? AND status = 'pending' AND agent_id IS NULL",
        )
        .bind(agent_id)
        .bind(chat_id)
        .execute(&self.pool)
        .await?;

        let rows = result.rows_affected();
        if rows == 1 {
            info!(chat_id = %chat_id, agent_id = %agent_id, "chat claimed");
        }
        Ok(rows)
    }

    /// Move a chat to `closed` from any non-closed state. Returns the number
    /// of affected rows; 0 means the chat was already closed or missing.
    pub async fn close(&self, chat_id: &str) -> ChatResult<u64> {
        let result = sqlx::query("UPDATE chats SET status = 'closed' WHERE id = ? AND status != 'closed'")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// List an agent's chats, optionally filtered by status.
    pub async fn list_for_agent(
        &self,
        agent_id: &str,
        status: Option<ChatStatus>,
    ) -> ChatResult<Vec<Chat>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT id, customer_name, status, agent_id, transcript, created_at
                     FROM chats WHERE agent_id = ? AND status = ?
                     ORDER BY created_at ASC",
                )
                .bind(agent_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, customer_name, status, agent_id, transcript, created_at
                     FROM chats WHERE agent_id = ?
                     ORDER BY created_at ASC",
                )
                .bind(agent_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_chat).collect()
    }

    /// List pending chats no agent has claimed yet.
    pub async fn list_available(&self) -> ChatResult<Vec<Chat>> {
        let rows = sqlx::query(
            "SELECT id, customer_name, status, agent_id, transcript, created_at
             FROM chats WHERE status = 'pending' AND agent_id IS NULL
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_chat).collect()
    }
}

fn row_to_chat(row: &SqliteRow) -> ChatResult<Chat> {
    let status: String = row.try_get("status")?;

    Ok(Chat {
        id: row.try_get("id")?,
        customer_name: row.try_get("customer_name")?,
        status: ChatStatus::from(status.as_str()),
        agent_id: row.try_get("agent_id")?,
        transcript: row.try_get("transcript")?,
        created_at: row.try_get("created_at")?,
    })
}
