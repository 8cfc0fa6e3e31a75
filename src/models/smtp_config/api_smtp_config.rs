//! API representation of an SMTP configuration. The password never leaves the store.

use super::db_smtp_config::SmtpConfiguration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ApiSmtpConfig {
  pub id: Uuid,
  pub name: String,
  pub host: String,
  pub port: u16,
  pub username: String,
  pub from_email: String,
  pub from_name: Option<String>,
  pub use_tls: bool,
  pub is_default: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<SmtpConfiguration> for ApiSmtpConfig {
  fn from(c: SmtpConfiguration) -> Self {
    ApiSmtpConfig {
      id: c.id,
      name: c.name,
      host: c.host,
      port: c.port,
      username: c.username,
      from_email: c.from_email,
      from_name: c.from_name,
      use_tls: c.use_tls,
      is_default: c.is_default,
      created_at: c.created_at,
      updated_at: c.updated_at,
    }
  }
}
