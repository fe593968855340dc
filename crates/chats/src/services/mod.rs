//! Services for the chat core.

pub mod lifecycle_service;

pub use lifecycle_service::LifecycleService;
