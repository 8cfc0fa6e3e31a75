//! API representation of a send history entry.

use super::{db_send_record::DbSendRecord, new_send_record::SendStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SendRecord {
  pub id: Uuid,
  pub smtp_config_id: Option<Uuid>,
  pub to: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cc: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bcc: Option<Vec<String>>,
  pub subject: String,
  pub body: String,
  pub is_html: bool,
  pub status: SendStatus,
  pub error_message: Option<String>,
  pub sent_at: DateTime<Utc>,
}

fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
  raw
    .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
    .filter(|v| !v.is_empty())
}

impl From<DbSendRecord> for SendRecord {
  fn from(d: DbSendRecord) -> Self {
    let to: Vec<String> = serde_json::from_str(&d.to_recipients).unwrap_or_default();
    SendRecord {
      id: d.id,
      smtp_config_id: d.smtp_config_id,
      to,
      cc: parse_list(d.cc_recipients.as_deref()),
      bcc: parse_list(d.bcc_recipients.as_deref()),
      subject: d.subject,
      body: d.body,
      is_html: d.is_html,
      status: d.status,
      error_message: d.error_message,
      sent_at: d.sent_at,
    }
  }
}
