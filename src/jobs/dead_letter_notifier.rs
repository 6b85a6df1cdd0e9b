//! Email notification for messages dead-lettered at the retry ceiling.
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info};

use crate::{
    config::DeadLetterEmailConfig,
    constants::PROPERTY_SERVICE_NAME,
    jobs::validator::callback_url,
    models::{CallbackMessage, RetryState},
    services::{MailOptions, MailerTrait},
    utils::panic_message,
};

/// Renders the plain-text notification body.
pub fn render_notification_text(message: &CallbackMessage, correlation_id: &str) -> String {
    format!(
        "A service callback message has been dead-lettered after exhausting all retries.\n\
         \n\
         Correlation ID: {}\n\
         Retries: {}\n\
         Service name: {}\n\
         Callback URL: {}\n\
         \n\
         Message body:\n\
         {}",
        correlation_id,
        RetryState::new(message.retries()).retries(),
        message
            .property_str(PROPERTY_SERVICE_NAME)
            .unwrap_or_default(),
        callback_url(message).unwrap_or_default(),
        message.body.to_display_string(),
    )
}

pub struct DeadLetterNotifier<M>
where
    M: MailerTrait,
{
    config: DeadLetterEmailConfig,
    mailer: M,
}

impl<M> DeadLetterNotifier<M>
where
    M: MailerTrait,
{
    pub fn new(config: DeadLetterEmailConfig, mailer: M) -> Self {
        Self { config, mailer }
    }

    /// Sends the notification. Returns whether an email was handed to the
    /// SMTP server; failures are logged and never propagated.
    pub async fn notify(&self, message: &CallbackMessage, correlation_id: &str) -> bool {
        let Some(email) = self.config.resolve() else {
            debug!("Dead-letter email disabled or incomplete, skipping notification");
            return false;
        };

        let options = MailOptions {
            from: email.from,
            to: email.to,
            subject: email.subject,
            text: render_notification_text(message, correlation_id),
        };

        let send = AssertUnwindSafe(async { self.mailer.send_mail(&email.smtp, &options).await })
            .catch_unwind()
            .await;
        match send {
            Ok(Ok(())) => {
                info!(recipients = options.to.len(), "Dead-letter notification sent");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to send dead-letter notification");
                false
            }
            Err(panic_info) => {
                error!(
                    panic = %panic_message(panic_info.as_ref()),
                    "Dead-letter notification panicked"
                );
                false
            }
        }
    }
}
