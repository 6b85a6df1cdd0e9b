//! Shared builders for pipeline tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use service_callback_dispatcher::{
    config::{BusConfig, DeadLetterEmailConfig, DispatcherConfig, S2sConfig, SmtpConfig},
    jobs::BatchOrchestrator,
    models::{CallbackMessage, MessageBody, MessageProperties, SecretString},
    queues::InMemoryQueue,
    services::{CallbackService, MailOptions, MailerTrait, NotificationError, S2sService},
};

/// base32 TOTP secret used by every test identity service.
pub const S2S_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
pub const TOKEN: &str = "leased-token";

pub type Orchestrator =
    BatchOrchestrator<InMemoryQueue, S2sService, CallbackService, RecordingMailer>;

/// Mailer that records every send instead of talking to an SMTP server.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<(SmtpConfig, MailOptions)>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(SmtpConfig, MailOptions)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailerTrait for RecordingMailer {
    async fn send_mail(
        &self,
        smtp: &SmtpConfig,
        options: &MailOptions,
    ) -> Result<(), NotificationError> {
        self.sent.lock().push((smtp.clone(), options.clone()));
        Ok(())
    }
}

pub struct TestServers {
    pub identity: MockServer,
    pub callback: MockServer,
}

impl TestServers {
    pub async fn start() -> Self {
        Self {
            identity: MockServer::start().await,
            callback: MockServer::start().await,
        }
    }

    pub fn callback_url(&self) -> String {
        format!("{}/payments/callback", self.callback.uri())
    }

    /// Identity service that always leases [`TOKEN`].
    pub async fn lease_tokens(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/lease"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN))
            .expect(expected_calls)
            .mount(&self.identity)
            .await;
    }

    /// Callback endpoint answering every PUT with `status`.
    pub async fn callback_responds(&self, status: u16, expected_calls: u64) {
        Mock::given(method("PUT"))
            .and(path("/payments/callback"))
            .respond_with(ResponseTemplate::new(status).set_body_string("callback response"))
            .expect(expected_calls)
            .mount(&self.callback)
            .await;
    }
}

pub fn complete_email_config() -> DeadLetterEmailConfig {
    DeadLetterEmailConfig {
        enabled: true,
        host: Some("smtp.example.com".to_string()),
        port: Some(587),
        secure: false,
        user: Some("mailer".to_string()),
        password: Some(SecretString::new("mail-password")),
        tls_protocol: Some("TLSv1.2".to_string()),
        from: Some("callbacks@example.com".to_string()),
        to: vec!["ops@example.com".to_string()],
        subject: Some("Service callback dead-lettered".to_string()),
    }
}

pub fn dispatcher_config(servers: &TestServers, email: DeadLetterEmailConfig) -> DispatcherConfig {
    DispatcherConfig {
        bus: BusConfig {
            connection: "memory://".to_string(),
            topic_name: "ccpay-service-callback".to_string(),
            subscription_name: "serviceCallbackFunction".to_string(),
            dead_letter_name: "serviceCallbackFunction-dead-letter".to_string(),
            endpoint_url: None,
        },
        process_messages_count: 10,
        delay_message_minutes: 15,
        s2s: S2sConfig {
            url: servers.identity.uri(),
            secret: SecretString::new(S2S_SECRET),
            microservice: "payment_app".to_string(),
        },
        extra_service_logging: true,
        dead_letter_email: email,
    }
}

pub fn orchestrator(
    config: &DispatcherConfig,
    queue: &InMemoryQueue,
    mailer: &RecordingMailer,
) -> Orchestrator {
    let client = reqwest::Client::new();
    BatchOrchestrator::from_config(
        config,
        queue.clone(),
        S2sService::new(config.s2s.clone(), client.clone()),
        CallbackService::new(client, config.extra_service_logging),
        mailer.clone(),
    )
}

pub fn callback_message(properties: Value) -> CallbackMessage {
    let properties: MessageProperties =
        serde_json::from_value(properties).expect("properties must be a JSON object");
    CallbackMessage::new(
        MessageBody::from_text(json!({"payment_reference": "RC-1234", "status": "Success"}).to_string()),
        Some(properties),
    )
}
