//! Database row for a stored SMTP configuration.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct SmtpConfiguration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub use_tls: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SmtpConfiguration {
    /// Sender mailbox text: `Name <email>` when a display name is set.
    pub fn from_header(&self) -> String {
        match self.from_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} <{}>", name, self.from_email),
            _ => self.from_email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from_name: Option<&str>) -> SmtpConfiguration {
        let now = Utc::now();
        SmtpConfiguration {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Work".into(),
            host: "smtp.example.test".into(),
            port: 587,
            username: "me".into(),
            password: "secret".into(),
            from_email: "me@example.test".into(),
            from_name: from_name.map(Into::into),
            use_tls: true,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn from_header_uses_display_name_when_present() {
        assert_eq!(config(Some("Jo Doe")).from_header(), "Jo Doe <me@example.test>");
    }

    #[test]
    fn from_header_falls_back_to_bare_email() {
        assert_eq!(config(None).from_header(), "me@example.test");
        assert_eq!(config(Some("  ")).from_header(), "me@example.test");
    }
}
