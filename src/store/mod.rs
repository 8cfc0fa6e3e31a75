//! Credential store: SMTP configurations and send history in SQLite.
//!
//! Every query is scoped by owner. A configuration owned by someone else is
//! indistinguishable from one that does not exist.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::{
        history::{
            api_send_record::SendRecord, db_send_record::DbSendRecord,
            new_send_record::NewSendRecord,
        },
        smtp_config::{db_smtp_config::SmtpConfiguration, smtp_config_input::ValidSmtpConfig},
    },
};

const CONFIG_COLUMNS: &str = "id, user_id, name, host, port, username, password, from_email, from_name, use_tls, is_default, created_at, updated_at";
const RECORD_COLUMNS: &str = "id, user_id, smtp_config_id, to_recipients, cc_recipients, bcc_recipients, subject, body, is_html, status, error_message, sent_at";

/// What the dispatch pipeline needs from storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load a configuration only if `owner` owns it.
    async fn get_configuration(&self, id: Uuid, owner: Uuid) -> Result<Option<SmtpConfiguration>>;

    /// Append one entry to the owner's send history.
    async fn insert_send_record(&self, record: NewSendRecord) -> Result<Uuid>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

fn list_json(list: &[String]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

/// Clear the default flag on all of `owner`'s configurations except `keep`.
async fn clear_other_defaults(
    tx: &mut Transaction<'_, Sqlite>,
    owner: Uuid,
    keep: Uuid,
) -> Result<()> {
    sqlx::query("UPDATE smtp_configs SET is_default = 0 WHERE user_id = ? AND id != ? AND is_default = 1")
        .bind(owner)
        .bind(keep)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        SqliteStore { db }
    }

    async fn fetch_configuration(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<SmtpConfiguration>> {
        let sql = format!("SELECT {CONFIG_COLUMNS} FROM smtp_configs WHERE id = ? AND user_id = ?");
        let row = sqlx::query_as::<_, SmtpConfiguration>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row)
    }

    /// Default first, then alphabetical.
    pub async fn list_configurations(&self, owner: Uuid) -> Result<Vec<SmtpConfiguration>> {
        let sql = format!(
            "SELECT {CONFIG_COLUMNS} FROM smtp_configs WHERE user_id = ? ORDER BY is_default DESC, name COLLATE NOCASE ASC"
        );
        let rows = sqlx::query_as::<_, SmtpConfiguration>(&sql)
            .bind(owner)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn create_configuration(
        &self,
        owner: Uuid,
        input: ValidSmtpConfig,
    ) -> Result<SmtpConfiguration> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        if input.is_default {
            clear_other_defaults(&mut tx, owner, id).await?;
        }
        sqlx::query(
            "INSERT INTO smtp_configs (id, user_id, name, host, port, username, password, from_email, from_name, use_tls, is_default, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(owner)
        .bind(&input.name)
        .bind(&input.host)
        .bind(input.port)
        .bind(&input.username)
        .bind(&input.password)
        .bind(&input.from_email)
        .bind(&input.from_name)
        .bind(input.use_tls)
        .bind(input.is_default)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let created = Self::fetch_configuration(&mut tx, id, owner)
            .await?
            .ok_or_else(|| Error::Internal("configuration vanished after insert".into()))?;
        tx.commit().await?;
        info!(config_id = %id, "smtp configuration created");
        Ok(created)
    }

    /// Replace the fields of an owned configuration. A blank password keeps
    /// the stored one.
    pub async fn update_configuration(
        &self,
        id: Uuid,
        owner: Uuid,
        input: ValidSmtpConfig,
    ) -> Result<SmtpConfiguration> {
        let mut tx = self.db.begin().await?;
        let existing = Self::fetch_configuration(&mut tx, id, owner)
            .await?
            .ok_or(Error::ConfigurationNotFound)?;
        if input.is_default {
            clear_other_defaults(&mut tx, owner, id).await?;
        }
        let password = if input.password.is_empty() {
            existing.password
        } else {
            input.password
        };
        sqlx::query(
            "UPDATE smtp_configs SET name = ?, host = ?, port = ?, username = ?, password = ?, from_email = ?, from_name = ?, use_tls = ?, is_default = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&input.name)
        .bind(&input.host)
        .bind(input.port)
        .bind(&input.username)
        .bind(password)
        .bind(&input.from_email)
        .bind(&input.from_name)
        .bind(input.use_tls)
        .bind(input.is_default)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;
        let updated = Self::fetch_configuration(&mut tx, id, owner)
            .await?
            .ok_or(Error::ConfigurationNotFound)?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Make one configuration the owner's only default.
    pub async fn set_default_configuration(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> Result<SmtpConfiguration> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query(
            "UPDATE smtp_configs SET is_default = 1, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::ConfigurationNotFound);
        }
        clear_other_defaults(&mut tx, owner, id).await?;
        let updated = Self::fetch_configuration(&mut tx, id, owner)
            .await?
            .ok_or(Error::ConfigurationNotFound)?;
        tx.commit().await?;
        Ok(updated)
    }

    /// History rows keep their data; their configuration reference becomes null.
    pub async fn delete_configuration(&self, id: Uuid, owner: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM smtp_configs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::ConfigurationNotFound);
        }
        info!(config_id = %id, "smtp configuration deleted");
        Ok(())
    }

    /// Newest first.
    pub async fn list_send_records(
        &self,
        owner: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SendRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM send_history WHERE user_id = ? ORDER BY sent_at DESC, rowid DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, DbSendRecord>(&sql)
            .bind(owner)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(SendRecord::from).collect())
    }

    pub async fn get_send_record(&self, id: Uuid, owner: Uuid) -> Result<SendRecord> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM send_history WHERE id = ? AND user_id = ?");
        sqlx::query_as::<_, DbSendRecord>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.db)
            .await?
            .map(SendRecord::from)
            .ok_or(Error::RecordNotFound)
    }

    pub async fn delete_send_record(&self, id: Uuid, owner: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM send_history WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn get_configuration(&self, id: Uuid, owner: Uuid) -> Result<Option<SmtpConfiguration>> {
        let sql = format!("SELECT {CONFIG_COLUMNS} FROM smtp_configs WHERE id = ? AND user_id = ?");
        let row = sqlx::query_as::<_, SmtpConfiguration>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn insert_send_record(&self, record: NewSendRecord) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO send_history (id, user_id, smtp_config_id, to_recipients, cc_recipients, bcc_recipients, subject, body, is_html, status, error_message, sent_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(record.user_id)
        .bind(record.smtp_config_id)
        .bind(list_json(&record.to))
        .bind(record.cc.as_deref().map(list_json))
        .bind(record.bcc.as_deref().map(list_json))
        .bind(&record.subject)
        .bind(&record.body)
        .bind(record.is_html)
        .bind(record.status)
        .bind(&record.error_message)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(id)
    }
}
