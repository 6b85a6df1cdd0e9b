//! Single-pass scenarios.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use service_callback_dispatcher::{
    config::DeadLetterEmailConfig, constants::MAX_RETRIES, jobs::validator, models::MessageBody,
    queues::InMemoryQueue,
};

use super::common::{fixtures::*, logging::init_test_logging};

#[tokio::test]
async fn test_valid_message_is_delivered_and_completed() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(1).await;
    Mock::given(method("PUT"))
        .and(path("/payments/callback"))
        .and(header("ServiceAuthorization", TOKEN))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("updated"))
        .expect(1)
        .mount(&servers.callback)
        .await;

    let queue = InMemoryQueue::new();
    queue.push(callback_message(json!({
        "serviceCallbackUrl": servers.callback_url(),
        "serviceName": "probate"
    })));
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.received, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.dead_lettered, 0);
    assert_eq!(queue.completed().len(), 1);
    assert!(queue.dead_lettered().is_empty());
    assert!(mailer.sent().is_empty());

    let callbacks = servers.callback.received_requests().await.unwrap();
    assert_eq!(
        callbacks[0].body,
        json!({"payment_reference": "RC-1234", "status": "Success"})
            .to_string()
            .into_bytes()
    );
}

#[tokio::test]
async fn test_message_without_callback_url_is_dead_lettered() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(0).await;
    servers.callback_responds(200, 0).await;

    let queue = InMemoryQueue::new();
    let message = callback_message(json!({"serviceName": "probate"}));
    assert!(!validator::validate(&message));
    queue.push(message);
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.dead_lettered, 1);
    assert_eq!(queue.dead_lettered().len(), 1);
    assert!(queue.completed().is_empty());
    // Invalid messages never trigger a notification.
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_ceiling_dead_letter_sends_one_notification() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(1).await;
    servers.callback_responds(500, 1).await;

    let queue = InMemoryQueue::new();
    let callback_url = servers.callback_url();
    queue.push(
        callback_message(json!({
            "serviceCallbackUrl": callback_url,
            "serviceName": "probate",
            "retries": MAX_RETRIES
        }))
        .with_correlation_id("777777"),
    );
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.dead_lettered, 1);
    assert_eq!(report.notifications_sent, 1);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let (smtp, mail) = &sent[0];
    assert_eq!(smtp.host, "smtp.example.com");
    assert_eq!(smtp.port, 587);
    assert_eq!(smtp.auth.as_ref().map(|a| a.user.as_str()), Some("mailer"));
    assert_eq!(mail.from, "callbacks@example.com");
    assert_eq!(mail.to, vec!["ops@example.com".to_string()]);
    assert_eq!(mail.subject, "Service callback dead-lettered");
    assert_eq!(
        mail.text,
        format!(
            "A service callback message has been dead-lettered after exhausting all retries.\n\
             \n\
             Correlation ID: 777777\n\
             Retries: 5\n\
             Service name: probate\n\
             Callback URL: {callback_url}\n\
             \n\
             Message body:\n\
             {{\"payment_reference\":\"RC-1234\",\"status\":\"Success\"}}"
        )
    );
}

#[tokio::test]
async fn test_disabled_email_never_sends() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(1).await;
    servers.callback_responds(502, 1).await;

    let queue = InMemoryQueue::new();
    queue.push(callback_message(json!({
        "servicecallbackurl": servers.callback_url(),
        "retries": MAX_RETRIES
    })));
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, DeadLetterEmailConfig::disabled());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.dead_lettered, 1);
    assert_eq!(report.notifications_sent, 0);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_empty_batch_does_nothing_and_closes_session() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(0).await;
    servers.callback_responds(200, 0).await;

    let queue = InMemoryQueue::new();
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.received, 0);
    assert_eq!(report.settled(), 0);
    assert_eq!(queue.sessions_opened(), 1);
    assert_eq!(queue.sessions_closed(), 1);
}

#[tokio::test]
async fn test_mixed_batch_settles_every_message_once() {
    init_test_logging();
    let servers = TestServers::start().await;
    servers.lease_tokens(2).await;
    servers.callback_responds(200, 2).await;

    let queue = InMemoryQueue::new();
    queue.push(service_callback_dispatcher::models::CallbackMessage::new(
        MessageBody::Absent,
        None,
    ));
    for _ in 0..2 {
        queue.push(callback_message(json!({
            "serviceCallbackUrl": servers.callback_url()
        })));
    }
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());

    let report = orchestrator(&config, &queue, &mailer)
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.received, 3);
    assert_eq!(report.completed, 2);
    assert_eq!(report.dead_lettered, 1);
    assert_eq!(queue.max_settlements_per_receipt(), 1);
    assert_eq!(queue.in_flight_len(), 0);
}
