//! Shared application state for the gateway

use std::sync::Arc;

use helpdesk_auth::Authenticator;
use helpdesk_chats::{LifecycleService, MessageRouter, RoomRegistry};
use sqlx::SqlitePool;

/// Shared application state wiring the chat core to its collaborators.
/// Everything hangs off the explicit pool handed in at construction; there
/// is no ambient database state anywhere.
#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub authenticator: Authenticator,
    pub lifecycle: Arc<LifecycleService>,
    pub rooms: Arc<RoomRegistry>,
    pub router: Arc<MessageRouter>,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator) -> Self {
        let lifecycle = Arc::new(LifecycleService::new(pool.clone()));
        let rooms = Arc::new(RoomRegistry::new());
        let router = Arc::new(MessageRouter::new(lifecycle.clone(), rooms.clone()));

        Self {
            pool,
            authenticator,
            lifecycle,
            rooms,
            router,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn lifecycle(&self) -> &LifecycleService {
        &self.lifecycle
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }
}
