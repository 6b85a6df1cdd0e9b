//! One dispatcher pass over the callback subscription.
//!
//! A pass opens a queue session, receives one bounded batch and processes the
//! messages one after another: validate, lease a token, PUT the callback, then
//! let the [`RetryCoordinator`] settle failures. Messages still pending after
//! that are completed. The session is closed on every exit path.
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn, Instrument};

use crate::{
    config::DispatcherConfig,
    jobs::{validator, DeadLetterNotifier, Resolution, RetryCoordinator},
    models::{
        BatchReport, DeliveryOutcome, DispatcherError, ReceivedMessage, Settlement,
        ValidatedMessage,
    },
    observability::message_span,
    queues::{QueueBackend, QueueSession},
    services::{CallbackServiceTrait, MailerTrait, S2sServiceTrait},
    utils::{generate_correlation_id, panic_message},
};

pub struct BatchOrchestrator<Q, T, C, M>
where
    Q: QueueBackend,
    T: S2sServiceTrait,
    C: CallbackServiceTrait,
    M: MailerTrait,
{
    queue: Q,
    token_provider: T,
    callback_service: C,
    coordinator: RetryCoordinator<M>,
    process_messages_count: usize,
}

impl<Q, T, C, M> BatchOrchestrator<Q, T, C, M>
where
    Q: QueueBackend,
    T: S2sServiceTrait,
    C: CallbackServiceTrait,
    M: MailerTrait,
{
    pub fn new(
        queue: Q,
        token_provider: T,
        callback_service: C,
        coordinator: RetryCoordinator<M>,
        process_messages_count: usize,
    ) -> Self {
        Self {
            queue,
            token_provider,
            callback_service,
            coordinator,
            process_messages_count,
        }
    }

    pub fn from_config(
        config: &DispatcherConfig,
        queue: Q,
        token_provider: T,
        callback_service: C,
        mailer: M,
    ) -> Self {
        let notifier = DeadLetterNotifier::new(config.dead_letter_email.clone(), mailer);
        Self::new(
            queue,
            token_provider,
            callback_service,
            RetryCoordinator::new(config.delay_message_minutes, notifier),
            config.process_messages_count,
        )
    }

    /// Runs one pass. Per-message failures are settled and logged; only
    /// failing to open the session, receive the batch or a panic outside any
    /// single message is an error.
    pub async fn run_once(&self) -> Result<BatchReport, DispatcherError> {
        let session = self.queue.open_session().await?;
        let result = match AssertUnwindSafe(self.process_batch(&session))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic_info) => {
                let msg = panic_message(panic_info.as_ref());
                error!(panic = %msg, "Batch processing panicked");
                Err(DispatcherError::Panicked(msg.to_string()))
            }
        };

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close queue session");
        }
        result
    }

    async fn process_batch(&self, session: &Q::Session) -> Result<BatchReport, DispatcherError> {
        let batch = session.receive_batch(self.process_messages_count).await?;
        let mut report = BatchReport {
            received: batch.len(),
            ..Default::default()
        };

        if batch.is_empty() {
            info!("No messages received from subscription");
            return Ok(report);
        }

        for received in batch {
            let received = with_correlation_id(received);
            let span = message_span(received.correlation_id(), received.message.retries());
            let resolution = match AssertUnwindSafe(self.process_message(session, &received))
                .catch_unwind()
                .instrument(span)
                .await
            {
                Ok(resolution) => resolution,
                Err(panic_info) => {
                    error!(
                        correlation_id = %received.correlation_id(),
                        panic = %panic_message(panic_info.as_ref()),
                        "Message processing panicked, leaving it to lock expiry"
                    );
                    Resolution {
                        settlement: Settlement::Abandoned,
                        notified: false,
                    }
                }
            };

            report.record(resolution.settlement);
            if resolution.notified {
                report.notifications_sent += 1;
            }
        }

        info!(
            received = report.received,
            completed = report.completed,
            dead_lettered = report.dead_lettered,
            redelivered = report.redelivered,
            abandoned = report.abandoned,
            notifications_sent = report.notifications_sent,
            "Batch pass finished"
        );
        Ok(report)
    }

    async fn process_message(
        &self,
        session: &Q::Session,
        received: &ReceivedMessage,
    ) -> Resolution {
        info!(
            body = %received.message.body.to_display_string(),
            "Received callback message"
        );

        let outcome = match validator::validated(&received.message) {
            Ok(valid) => {
                info!(
                    callback_url = %valid.callback_url,
                    service_name = %valid.service_name,
                    "Message is valid"
                );
                self.deliver(&valid).await
            }
            Err(e) => {
                warn!(reason = %e, "Message is invalid");
                DeliveryOutcome::Invalid(e.to_string())
            }
        };

        let mut resolution = self.coordinator.resolve(session, received, &outcome).await;
        if resolution.settlement == Settlement::Pending {
            resolution.settlement = match session.complete(received).await {
                Ok(()) => {
                    info!("Message completed");
                    Settlement::Completed
                }
                Err(e) => {
                    error!(error = %e, "Failed to complete message");
                    Settlement::Abandoned
                }
            };
        }
        resolution
    }

    /// Leases a token and calls back. A panic in either step counts as a
    /// recoverable failure.
    async fn deliver(&self, message: &ValidatedMessage) -> DeliveryOutcome {
        match AssertUnwindSafe(self.attempt_delivery(message))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic_info) => {
                let msg = panic_message(panic_info.as_ref());
                error!(panic = %msg, "Message delivery panicked");
                DeliveryOutcome::RecoverableFailure(format!("delivery panicked: {msg}"))
            }
        }
    }

    async fn attempt_delivery(&self, message: &ValidatedMessage) -> DeliveryOutcome {
        let token = match self.token_provider.obtain_token().await {
            Ok(token) => {
                info!("S2S token retrieved");
                token
            }
            Err(e) => {
                warn!(error = %e, "Failed to obtain S2S token");
                return DeliveryOutcome::RecoverableFailure(e.to_string());
            }
        };

        info!(callback_url = %message.callback_url, "About to post callback URL");
        let outcome = self
            .callback_service
            .dispatch(&message.callback_url, &message.body, &token)
            .await;

        match &outcome {
            DeliveryOutcome::Success(response) => {
                info!(response = %response, "Message sent successfully");
            }
            other => {
                warn!(reason = %other.reason(), "Callback attempt failed");
            }
        }
        outcome
    }
}

/// Assigns a generated correlation id to messages that arrive without one,
/// so that redelivery clones carry it forward.
fn with_correlation_id(mut received: ReceivedMessage) -> ReceivedMessage {
    let missing = received
        .message
        .correlation_id
        .as_deref()
        .is_none_or(str::is_empty);
    if missing {
        received.message.correlation_id = Some(generate_correlation_id());
    }
    received
}
