//! Identity provider: accounts, password checks and bearer sessions.
//!
//! The dispatch pipeline only needs [`IdentityProvider::resolve_caller`];
//! the account operations on [`SqliteIdentity`] back the `/auth` routes.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::user::user_identity::UserIdentity,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Resolves the caller of a request from the token it presented.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when the token is unknown or expired.
    async fn resolve_caller(&self, token: &str) -> Result<Option<UserIdentity>>;
}

/// SQLite-backed accounts and sessions.
#[derive(Clone)]
pub struct SqliteIdentity {
    db: SqlitePool,
    session_ttl: Duration,
}

/// Opaque bearer token: 32 random bytes, URL-safe base64.
fn new_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    B64.encode(bytes)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    email
        .parse::<lettre::Address>()
        .map_err(|_| Error::InvalidRequest("Invalid email address".into()))?;
    Ok(email)
}

impl SqliteIdentity {
    pub fn new(db: SqlitePool, session_ttl: Duration) -> Self {
        SqliteIdentity { db, session_ttl }
    }

    async fn issue_session(&self, user_id: Uuid) -> Result<String> {
        let token = new_token();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(now)
        .bind(now + self.session_ttl)
        .execute(&self.db)
        .await?;
        Ok(token)
    }

    /// Create an account and open a first session for it.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<(UserIdentity, String)> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidRequest(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.db)
            .await?;
        if exists.is_some() {
            return Err(Error::Conflict("An account with this email already exists".into()));
        }

        let user = UserIdentity {
            id: Uuid::new_v4(),
            email,
            display_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };
        let phc = hash_password(password)?;
        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(phc)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        info!(user_id = %user.id, "account created");

        let token = self.issue_session(user.id).await?;
        Ok((user, token))
    }

    /// Check a password and open a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(UserIdentity, String)> {
        let email = email.trim().to_lowercase();
        let row: Option<(Uuid, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, email, display_name, password_hash FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?;
        let Some((id, email, display_name, phc)) = row else {
            return Err(Error::InvalidCredentials);
        };
        if !verify_password(password, &phc) {
            debug!(user_id = %id, "password mismatch");
            return Err(Error::InvalidCredentials);
        }
        let token = self.issue_session(id).await?;
        Ok((
            UserIdentity {
                id,
                email,
                display_name,
            },
            token,
        ))
    }

    /// Drop a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Remove the account; sessions, configurations and history go with it.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        info!(%user_id, "account deleted");
        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentity {
    async fn resolve_caller(&self, token: &str) -> Result<Option<UserIdentity>> {
        let user = sqlx::query_as::<_, UserIdentity>(
            "SELECT u.id, u.email, u.display_name FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ? AND s.expires_at > ?",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
