//! SMTP delivery of dead-letter notifications.
//!
//! lettre's SMTP transport is synchronous, so each send runs on the blocking
//! thread pool.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters, TlsVersion},
    },
    Message, SmtpTransport, Transport,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::SmtpConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotificationError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    BuildError(String),

    #[error("SMTP transport error: {0}")]
    TransportError(String),
}

/// Envelope and content of one notification email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailOptions {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait MailerTrait: Send + Sync {
    async fn send_mail(
        &self,
        smtp: &SmtpConfig,
        options: &MailOptions,
    ) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailerTrait for SmtpMailer {
    async fn send_mail(
        &self,
        smtp: &SmtpConfig,
        options: &MailOptions,
    ) -> Result<(), NotificationError> {
        let email = build_message(options)?;
        let transport = build_transport(smtp)?;

        debug!(host = %smtp.host, port = smtp.port, "sending notification email");
        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| NotificationError::TransportError(format!("send task failed: {e}")))?
            .map_err(|e| NotificationError::TransportError(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::InvalidAddress(format!("{address}: {e}")))
}

fn build_message(options: &MailOptions) -> Result<Message, NotificationError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&options.from)?)
        .subject(options.subject.clone())
        .header(ContentType::TEXT_PLAIN);
    for recipient in &options.to {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    builder
        .body(options.text.clone())
        .map_err(|e| NotificationError::BuildError(e.to_string()))
}

fn build_transport(smtp: &SmtpConfig) -> Result<SmtpTransport, NotificationError> {
    let mut tls_builder = TlsParameters::builder(smtp.host.clone());
    if let Some(protocol) = smtp.tls_protocol.as_deref() {
        match min_tls_version(protocol) {
            Some(version) => tls_builder = tls_builder.set_min_tls_version(version),
            None => warn!(tls_protocol = %protocol, "unsupported SMTP TLS protocol ignored"),
        }
    }
    let tls_parameters = tls_builder
        .build()
        .map_err(|e| NotificationError::TransportError(e.to_string()))?;

    let tls = if smtp.secure {
        Tls::Wrapper(tls_parameters)
    } else {
        Tls::Opportunistic(tls_parameters)
    };

    let mut builder = SmtpTransport::builder_dangerous(smtp.host.as_str())
        .port(smtp.port)
        .tls(tls);
    if let Some(auth) = &smtp.auth {
        builder = builder.credentials(Credentials::new(
            auth.user.clone(),
            auth.password.to_str().to_string(),
        ));
    }
    Ok(builder.build())
}

/// Maps a configured protocol name onto a minimum TLS version. Accepts both
/// `TLSv1.2` and OpenSSL method names such as `TLSv1_2_method`.
fn min_tls_version(protocol: &str) -> Option<TlsVersion> {
    let normalized = protocol
        .trim()
        .trim_end_matches("_method")
        .replace('_', ".")
        .to_ascii_lowercase();
    match normalized.as_str() {
        "tlsv1.2" => Some(TlsVersion::Tlsv12),
        "tlsv1.3" => Some(TlsVersion::Tlsv13),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpAuth;
    use crate::models::SecretString;

    fn options() -> MailOptions {
        MailOptions {
            from: "callbacks@example.com".to_string(),
            to: vec!["ops@example.com".to_string(), "dev@example.com".to_string()],
            subject: "Dead-lettered callback".to_string(),
            text: "Correlation ID: 123456".to_string(),
        }
    }

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            secure: false,
            tls_protocol: Some("TLSv1_2_method".to_string()),
            auth: Some(SmtpAuth {
                user: "mailer".to_string(),
                password: SecretString::new("pw"),
            }),
        }
    }

    #[test]
    fn test_build_message_includes_all_recipients() {
        let message = build_message(&options()).unwrap();
        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(|a| a.to_string()).as_deref(),
            Some("callbacks@example.com")
        );
    }

    #[test]
    fn test_build_message_rejects_invalid_address() {
        let invalid = MailOptions {
            to: vec!["not an address".to_string()],
            ..options()
        };
        assert!(matches!(
            build_message(&invalid),
            Err(NotificationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_min_tls_version_names() {
        assert!(matches!(min_tls_version("TLSv1.2"), Some(TlsVersion::Tlsv12)));
        assert!(matches!(min_tls_version("TLSv1_2_method"), Some(TlsVersion::Tlsv12)));
        assert!(matches!(min_tls_version("tlsv1.3"), Some(TlsVersion::Tlsv13)));
        assert!(min_tls_version("SSLv3_method").is_none());
    }

    #[test]
    fn test_build_transport_for_both_tls_modes() {
        assert!(build_transport(&smtp()).is_ok());
        let secure = SmtpConfig {
            secure: true,
            port: 465,
            auth: None,
            tls_protocol: None,
            ..smtp()
        };
        assert!(build_transport(&secure).is_ok());
    }

    #[tokio::test]
    async fn test_send_mail_to_unreachable_server_fails() {
        let unreachable = SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            secure: false,
            tls_protocol: None,
            auth: None,
        };
        let result = SmtpMailer::new().send_mail(&unreachable, &options()).await;
        assert!(matches!(result, Err(NotificationError::TransportError(_))));
    }
}
