//! Chat lifecycle management.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

use helpdesk_database::{
    Chat, ChatError, ChatMessage, ChatRepository, ChatResult, ChatStatus, MessageRepository,
    SenderType,
};

/// Owns the per-chat state machine (pending → active → closed) and the
/// assignment race resolution.
///
/// Every mutating operation serializes on a per-chat async mutex held for
/// the duration of its store transaction; operations on distinct chats run
/// in parallel, and reads go straight to committed state without locking.
pub struct LifecycleService {
    chats: ChatRepository,
    messages: MessageRepository,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LifecycleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            chats: ChatRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            locks: Mutex::new(HashMap::new()),
        }
    }

    // TODO: drop a chat's lock entry once it is closed and its room has
    // drained; entries currently accumulate for the process lifetime.
    async fn chat_lock(&self, chat_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(chat_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Open a new chat for a customer. The chat starts `pending`; an
    /// optional first message is stored atomically with it. No lock is
    /// taken: the chat id is fresh, so nothing can contend on it yet.
    pub async fn create_chat(
        &self,
        customer_name: &str,
        initial_message: Option<&str>,
    ) -> ChatResult<Chat> {
        if customer_name.trim().is_empty() {
            return Err(ChatError::validation("customer name must not be empty"));
        }

        let initial_message = initial_message.filter(|content| !content.is_empty());
        self.chats.create(customer_name, initial_message).await
    }

    /// Claim a pending chat for an agent.
    ///
    /// Under concurrent claims for the same chat exactly one caller wins;
    /// the conditional update's affected-row count is the sole arbiter.
    /// Losers see `AlreadyAssigned`, claims on unknown chats `ChatNotFound`.
    pub async fn assign_agent(&self, chat_id: &str, agent_id: &str) -> ChatResult<Chat> {
        let lock = self.chat_lock(chat_id).await;
        let _guard = lock.lock().await;

        let rows = self.chats.claim_for_agent(chat_id, agent_id).await?;
        if rows == 0 {
            return match self.chats.find_by_id(chat_id).await? {
                Some(_) => Err(ChatError::AlreadyAssigned),
                None => Err(ChatError::ChatNotFound),
            };
        }

        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    /// Close a chat from any non-closed state. Closing an already-closed
    /// chat succeeds as a no-op: disconnect races routinely produce
    /// duplicate close events and they must not surface as errors.
    pub async fn close_chat(&self, chat_id: &str, closer_id: &str) -> ChatResult<Chat> {
        let lock = self.chat_lock(chat_id).await;
        let _guard = lock.lock().await;

        let chat = self
            .chats
            .find_by_id(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)?;

        if chat.status == ChatStatus::Closed {
            return Ok(chat);
        }

        self.chats.close(chat_id).await?;
        info!(chat_id = %chat_id, closer_id = %closer_id, "chat closed");

        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    /// Store a message and its transcript line. Rejected when the content
    /// is empty or the chat is closed; the store assigns the timestamp.
    pub async fn append_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        sender_type: SenderType,
        content: &str,
    ) -> ChatResult<ChatMessage> {
        if content.is_empty() {
            return Err(ChatError::validation("message content must not be empty"));
        }

        let lock = self.chat_lock(chat_id).await;
        let _guard = lock.lock().await;

        self.messages
            .append(chat_id, sender_id, sender_type, content)
            .await
    }

    pub async fn get_chat(&self, chat_id: &str) -> ChatResult<Chat> {
        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    pub async fn list_messages(&self, chat_id: &str) -> ChatResult<Vec<ChatMessage>> {
        self.messages.list_for_chat(chat_id).await
    }

    pub async fn list_chats(
        &self,
        agent_id: &str,
        status: Option<ChatStatus>,
    ) -> ChatResult<Vec<Chat>> {
        self.chats.list_for_agent(agent_id, status).await
    }

    pub async fn list_available(&self) -> ChatResult<Vec<Chat>> {
        self.chats.list_available().await
    }
}
