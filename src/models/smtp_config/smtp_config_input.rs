//! Create/update payload for SMTP configurations and its validation.

use serde::Deserialize;

/// Incoming configuration fields as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpConfigInput {
    pub name: String,
    pub host: String,
    pub port: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default)]
    pub is_default: bool,
}

/// Configuration fields after validation, trimmed and range-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSmtpConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub use_tls: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValidationError {
    EmptyName,
    EmptyHost,
    InvalidPort,
    EmptyFromEmail,
    InvalidFromEmail,
}

impl ConfigValidationError {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyName => "Configuration name is required",
            Self::EmptyHost => "SMTP host is required",
            Self::InvalidPort => "SMTP port must be 1-65535",
            Self::EmptyFromEmail => "From email is required",
            Self::InvalidFromEmail => "Invalid from email address",
        }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl SmtpConfigInput {
    /// Check every field and return all problems at once.
    ///
    /// # Errors
    ///
    /// Returns each violated rule, in field order.
    pub fn validate(&self) -> Result<ValidSmtpConfig, Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(ConfigValidationError::EmptyName);
        }
        let host = self.host.trim();
        if host.is_empty() {
            errors.push(ConfigValidationError::EmptyHost);
        }
        let port = u16::try_from(self.port).ok().filter(|p| *p != 0);
        if port.is_none() {
            errors.push(ConfigValidationError::InvalidPort);
        }
        let from_email = self.from_email.trim();
        if from_email.is_empty() {
            errors.push(ConfigValidationError::EmptyFromEmail);
        } else if from_email.parse::<lettre::Address>().is_err() {
            errors.push(ConfigValidationError::InvalidFromEmail);
        }

        match port {
            Some(port) if errors.is_empty() => Ok(ValidSmtpConfig {
                name: name.to_string(),
                host: host.to_string(),
                port,
                username: self.username.trim().to_string(),
                password: self.password.clone(),
                from_email: from_email.to_string(),
                from_name: self
                    .from_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
                use_tls: self.use_tls,
                is_default: self.is_default,
            }),
            _ => Err(errors),
        }
    }
}

/// Join validation failures into one caller-facing message.
pub fn describe(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ConfigValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SmtpConfigInput {
        SmtpConfigInput {
            name: " Work ".into(),
            host: "smtp.example.test".into(),
            port: 587,
            username: "me".into(),
            password: "secret".into(),
            from_email: "me@example.test".into(),
            from_name: Some("  ".into()),
            use_tls: true,
            is_default: false,
        }
    }

    #[test]
    fn valid_input_is_trimmed() {
        let v = input().validate().unwrap();
        assert_eq!(v.name, "Work");
        assert_eq!(v.port, 587);
        assert_eq!(v.from_name, None);
    }

    #[test]
    fn port_range_is_enforced() {
        for port in [0, -1, 65536] {
            let mut i = input();
            i.port = port;
            assert_eq!(i.validate().unwrap_err(), vec![ConfigValidationError::InvalidPort]);
        }
        let mut i = input();
        i.port = 65535;
        assert!(i.validate().is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let i = SmtpConfigInput {
            from_email: "nope".into(),
            ..SmtpConfigInput::default()
        };
        let errs = i.validate().unwrap_err();
        assert_eq!(
            errs,
            vec![
                ConfigValidationError::EmptyName,
                ConfigValidationError::EmptyHost,
                ConfigValidationError::InvalidPort,
                ConfigValidationError::InvalidFromEmail,
            ]
        );
        assert!(describe(&errs).contains("SMTP port must be 1-65535"));
    }
}
