//! A send attempt about to be written to history.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSendRecord {
    pub user_id: Uuid,
    pub smtp_config_id: Option<Uuid>,
    pub to: Vec<String>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub status: SendStatus,
    pub error_message: Option<String>,
}
