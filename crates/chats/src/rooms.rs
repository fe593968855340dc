//! Room registry: which live sessions are interested in which chat.
//!
//! Purely in-memory membership tracking, independent of persistence. State
//! is lost on restart and rebuilt from live connections, which limits this
//! design to a single server process.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use crate::types::ServerEvent;

/// Opaque handle for one connected realtime client.
pub type SessionId = u64;

/// Per-session outbound channel capacity. Mirrors the write side of the
/// session gateway; a session that cannot drain this many events is dying.
pub const SESSION_CHANNEL_CAPACITY: usize = 100;

pub struct RoomRegistry {
    next_session_id: AtomicU64,
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    rooms: HashMap<String, HashSet<SessionId>>,
    sessions: HashMap<SessionId, mpsc::Sender<ServerEvent>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            next_session_id: AtomicU64::new(1),
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a connected session and hand back its handle. The returned
    /// id stays valid until `unregister`.
    pub async fn register(&self, sender: mpsc::Sender<ServerEvent>) -> SessionId {
        let session = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.inner.write().await.sessions.insert(session, sender);
        debug!(session, "session registered");
        session
    }

    /// Add a session to a chat's room. Set semantics: joining twice has the
    /// effect of joining once, and membership in other rooms is untouched.
    pub async fn join(&self, chat_id: &str, session: SessionId) {
        let mut inner = self.inner.write().await;
        if !inner.sessions.contains_key(&session) {
            return;
        }
        inner
            .rooms
            .entry(chat_id.to_owned())
            .or_default()
            .insert(session);
    }

    /// Remove a session from one room. No error if it was never a member.
    pub async fn leave(&self, chat_id: &str, session: SessionId) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(chat_id) {
            members.remove(&session);
            if members.is_empty() {
                inner.rooms.remove(chat_id);
            }
        }
    }

    /// Remove a session from every room and drop its outbound channel.
    /// Called when the session's connection goes away.
    pub async fn unregister(&self, session: SessionId) {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(&session);
        inner.rooms.retain(|_, members| {
            members.remove(&session);
            !members.is_empty()
        });
        debug!(session, "session unregistered");
    }

    /// Deliver an event to every session in the room at the moment of the
    /// call. Sessions joining afterwards do not retroactively receive it;
    /// history replay is the store's job, not the registry's. Membership is
    /// snapshotted first so no delivery happens under the registry lock.
    pub async fn broadcast(&self, chat_id: &str, event: ServerEvent) {
        let targets: Vec<mpsc::Sender<ServerEvent>> = {
            let inner = self.inner.read().await;
            let Some(members) = inner.rooms.get(chat_id) else {
                return;
            };
            members
                .iter()
                .filter_map(|session| inner.sessions.get(session).cloned())
                .collect()
        };

        for sender in targets {
            // A closed channel means the session is on its way out; its
            // membership is removed by the disconnect path.
            let _ = sender.send(event.clone()).await;
        }
    }

    /// Deliver an event to a single session, e.g. a sender-only error.
    pub async fn send_to(&self, session: SessionId, event: ServerEvent) {
        let sender = self.inner.read().await.sessions.get(&session).cloned();
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
