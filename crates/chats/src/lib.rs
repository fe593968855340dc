//! Helpdesk Chat Core
//!
//! The heart of the system: the chat lifecycle state machine with its
//! assignment race resolution, the in-memory room registry, and the
//! realtime router that keeps persistence and broadcast in step.

pub mod rooms;
pub mod router;
pub mod services;
pub mod types;

pub use rooms::{RoomRegistry, SessionId, SESSION_CHANNEL_CAPACITY};
pub use router::MessageRouter;
pub use services::LifecycleService;
pub use types::{ClientEvent, ServerEvent};
