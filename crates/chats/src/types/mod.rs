//! Shared types for the chat core.

pub mod events;

pub use events::{ClientEvent, ServerEvent};
