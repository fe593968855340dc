//! Helpdesk Database Crate
//!
//! Durable store for chats, messages, agents and login sessions: connection
//! management, embedded migrations and the repository implementations the
//! lifecycle layer is built on.

use sqlx::SqlitePool;

use helpdesk_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{ChatRepository, MessageRepository};

pub use entities::{
    chat::{Chat, ChatStatus},
    message::{ChatMessage, SenderType},
};

pub use types::{
    errors::{ChatError, DatabaseError},
    ChatResult, DatabaseResult,
};

/// Prepare the connection pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}


#[cfg(test)]
mod tests {
    use super::test_support::create_test_pool;

    #[tokio::test]
    async fn test_database_initialization_applies_schema() {
        let (pool, _temp_dir) = create_test_pool().await;

        for table in ["agents", "sessions", "chats", "messages"] {
            let found: Option<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&pool)
            .await
            .unwrap();
            assert_eq!(found.as_deref(), Some(table));
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = create_test_pool().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(result.0);
    }
}
