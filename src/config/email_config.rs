//! Dead-letter email notification settings.
use crate::models::{ConfigError, SecretString};

use super::dispatcher_config::{env_bool, env_optional, env_parse};

/// SMTP connection settings handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS on connect; otherwise STARTTLS is used when offered.
    pub secure: bool,
    pub tls_protocol: Option<String>,
    pub auth: Option<SmtpAuth>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpAuth {
    pub user: String,
    pub password: SecretString,
}

/// Raw email block as configured. Every field is optional so that a partial
/// configuration disables notifications instead of failing startup.
#[derive(Debug, Clone, Default)]
pub struct DeadLetterEmailConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub tls_protocol: Option<String>,
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: Option<String>,
}

/// Email settings that are complete enough to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEmailConfig {
    pub smtp: SmtpConfig,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
}

impl DeadLetterEmailConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env_optional("SMTP_PORT") {
            Some(_) => Some(env_parse::<u16>("SMTP_PORT", 0)?),
            None => None,
        };

        Ok(Self {
            enabled: env_bool("DEAD_LETTER_EMAIL_ENABLED", false)?,
            host: env_optional("SMTP_HOST"),
            port,
            secure: env_bool("SMTP_SECURE", false)?,
            user: env_optional("SMTP_USER"),
            password: env_optional("SMTP_PASSWORD").map(SecretString::from),
            tls_protocol: env_optional("SMTP_TLS_PROTOCOL"),
            from: env_optional("DEAD_LETTER_EMAIL_FROM"),
            to: env_optional("DEAD_LETTER_EMAIL_TO")
                .map(|raw| parse_recipients(&raw))
                .unwrap_or_default(),
            subject: env_optional("DEAD_LETTER_EMAIL_SUBJECT"),
        })
    }

    /// Returns the sendable settings, or `None` when notifications are
    /// disabled or host, port, from, to or subject is missing.
    pub fn resolve(&self) -> Option<ResolvedEmailConfig> {
        if !self.enabled || self.to.is_empty() {
            return None;
        }

        let auth = match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some(SmtpAuth {
                user: user.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        Some(ResolvedEmailConfig {
            smtp: SmtpConfig {
                host: self.host.clone()?,
                port: self.port?,
                secure: self.secure,
                tls_protocol: self.tls_protocol.clone(),
                auth,
            },
            from: self.from.clone()?,
            to: self.to.clone(),
            subject: self.subject.clone()?,
        })
    }
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}
