//! A message whose callback keeps failing, followed across passes.

use serde_json::json;

use service_callback_dispatcher::{constants::MAX_RETRIES, queues::InMemoryQueue};

use super::common::{fixtures::*, logging::init_test_logging};

#[tokio::test]
async fn test_retries_grow_until_dead_letter_on_sixth_failure() {
    init_test_logging();
    let attempts = u64::from(MAX_RETRIES) + 1;
    let servers = TestServers::start().await;
    servers.lease_tokens(attempts).await;
    servers.callback_responds(500, attempts).await;

    let queue = InMemoryQueue::new();
    queue.push(callback_message(json!({
        "serviceCallbackUrl": servers.callback_url(),
        "serviceName": "probate"
    })));
    let mailer = RecordingMailer::default();
    let config = dispatcher_config(&servers, complete_email_config());
    let orchestrator = orchestrator(&config, &queue, &mailer);

    let mut correlation_id = None;
    for expected_retries in 1..=MAX_RETRIES {
        let report = orchestrator.run_once().await.unwrap();
        assert_eq!(report.redelivered, 1);
        assert!(queue.completed().is_empty());

        let scheduled = queue.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].message.retries(), expected_retries);

        // The generated correlation id travels with every clone.
        let id = scheduled[0].message.correlation_id.clone();
        assert!(id.is_some());
        if let Some(previous) = &correlation_id {
            assert_eq!(&id, previous);
        }
        correlation_id = Some(id);

        assert_eq!(queue.release_scheduled(), 1);
    }

    let report = orchestrator.run_once().await.unwrap();
    assert_eq!(report.dead_lettered, 1);
    assert_eq!(report.notifications_sent, 1);
    assert!(queue.scheduled().is_empty());
    assert!(queue.completed().is_empty());

    let dead = queue.dead_lettered();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].message.retries(), MAX_RETRIES);
    assert_eq!(mailer.sent().len(), 1);
    assert!(mailer.sent()[0].1.text.contains("Retries: 5"));
    assert_eq!(queue.sessions_closed(), queue.sessions_opened());
}
