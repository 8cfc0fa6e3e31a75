//! Database row for a send history entry.

use super::new_send_record::SendStatus;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct DbSendRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub smtp_config_id: Option<Uuid>,
    pub to_recipients: String,
    pub cc_recipients: Option<String>,
    pub bcc_recipients: Option<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub status: SendStatus,
    pub error_message: Option<String>,
    pub sent_at: DateTime<Utc>,
}
