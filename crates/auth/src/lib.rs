//! Agent identity provider for the helpdesk backend.
//!
//! Agents are provisioned administratively and log in with email/password.
//! A successful login issues an opaque session token; everything above this
//! crate treats the returned agent id as an opaque stable identity.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use helpdesk_config::AuthConfig;
use rand::RngCore;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::info;

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("agent already exists")]
    AgentExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

/// Stable agent identity as consumed by the rest of the system. The
/// password hash never leaves this crate.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub agent_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let session_ttl = Duration::seconds(config.session_ttl_seconds as i64);

        Self { pool, session_ttl }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Administrative provisioning of an agent account.
    pub async fn create_agent(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Agent, AuthError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM agents WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(AuthError::AgentExists);
        }

        let id = cuid2::create_id();
        let now = Utc::now().to_rfc3339();
        let password_hash = self.hash_password(password)?;

        sqlx::query(
            "INSERT INTO agents (id, email, display_name, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(agent_id = %id, email = %email, "provisioned agent");

        Ok(Agent {
            id,
            email: email.to_owned(),
            display_name: display_name.to_owned(),
        })
    }

    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Agent, AuthSession), AuthError> {
        let row = sqlx::query(
            "SELECT id, email, display_name, password_hash FROM agents WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let secret: String = row.try_get("password_hash")?;
        let stored_hash = PasswordHash::new(&secret)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let agent = Agent {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
        };

        let session = self.issue_session(&agent.id).await?;
        Ok((agent, session))
    }

    /// Resolve a session token back to its agent. Expired sessions are
    /// removed on the way out.
    pub async fn authenticate_token(&self, token: &str) -> Result<(Agent, AuthSession), AuthError> {
        let row = sqlx::query("SELECT agent_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::SessionNotFound);
        };

        let agent_id: String = row.try_get("agent_id")?;
        let expires_at: String = row.try_get("expires_at")?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            sqlx::query("DELETE FROM sessions WHERE token = ?")
                .bind(token)
                .execute(&self.pool)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let agent = self.fetch_agent(&agent_id).await?;
        let session = AuthSession {
            token: token.to_owned(),
            agent_id,
            expires_at,
        };

        Ok((agent, session))
    }

    async fn fetch_agent(&self, agent_id: &str) -> Result<Agent, AuthError> {
        let row = sqlx::query("SELECT id, email, display_name FROM agents WHERE id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(AuthError::InvalidSession);
        };

        Ok(Agent {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
        })
    }

    async fn issue_session(&self, agent_id: &str) -> Result<AuthSession, AuthError> {
        let token = self.generate_session_token();
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        sqlx::query(
            "INSERT INTO sessions (token, agent_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(agent_id)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(AuthSession {
            token,
            agent_id: agent_id.to_owned(),
            expires_at,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn generate_session_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}
