//! Retry and dead-letter decisions for a processed message.
//!
//! The decision itself is pure ([`decide`]); [`RetryCoordinator::resolve`]
//! carries it out against the queue session and reports the settlement.
//!
//! # Retry Strategy
//! - Success: no action, the message is completed by the orchestrator
//! - Invalid: dead-letter, no notification
//! - Recoverable below [`MAX_RETRIES`]: replace with a clone carrying `retries + 1`,
//!   visible again after the configured delay
//! - Recoverable at [`MAX_RETRIES`]: dead-letter, then notify
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::{
    constants::MAX_RETRIES,
    jobs::DeadLetterNotifier,
    models::{CallbackMessage, DeliveryOutcome, ReceivedMessage, RetryState, Settlement},
    queues::QueueSession,
    services::MailerTrait,
    utils::calculate_redelivery_time,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    DeadLetter { reason: String, notify: bool },
    Redeliver {
        clone: CallbackMessage,
        not_before: DateTime<Utc>,
    },
}

/// Settlement reached for one message, plus whether a notification went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub settlement: Settlement,
    pub notified: bool,
}

impl Resolution {
    pub fn pending() -> Self {
        Self::settled(Settlement::Pending)
    }

    fn settled(settlement: Settlement) -> Self {
        Self {
            settlement,
            notified: false,
        }
    }
}

/// Returns the action for `outcome`, or `None` when the message should be
/// completed normally.
pub fn decide(
    outcome: &DeliveryOutcome,
    message: &CallbackMessage,
    delay_message_minutes: i64,
) -> Option<RetryDecision> {
    match outcome {
        DeliveryOutcome::Success(_) => None,
        DeliveryOutcome::Invalid(reason) => Some(RetryDecision::DeadLetter {
            reason: reason.clone(),
            notify: false,
        }),
        DeliveryOutcome::RecoverableFailure(reason) => {
            match RetryState::new(message.retries()).next() {
                Some(next) => Some(RetryDecision::Redeliver {
                    clone: message.redelivery_clone(next.retries()),
                    not_before: calculate_redelivery_time(delay_message_minutes),
                }),
                None => Some(RetryDecision::DeadLetter {
                    reason: format!("Retry limit of {MAX_RETRIES} reached: {reason}"),
                    notify: true,
                }),
            }
        }
    }
}

pub struct RetryCoordinator<M>
where
    M: MailerTrait,
{
    delay_message_minutes: i64,
    notifier: DeadLetterNotifier<M>,
}

impl<M> RetryCoordinator<M>
where
    M: MailerTrait,
{
    pub fn new(delay_message_minutes: i64, notifier: DeadLetterNotifier<M>) -> Self {
        Self {
            delay_message_minutes,
            notifier,
        }
    }

    /// Applies the decision for `outcome`. Settlement failures are logged and
    /// leave the message to the queue's lock expiry.
    pub async fn resolve<S>(
        &self,
        session: &S,
        received: &ReceivedMessage,
        outcome: &DeliveryOutcome,
    ) -> Resolution
    where
        S: QueueSession + ?Sized,
    {
        match decide(outcome, &received.message, self.delay_message_minutes) {
            None => Resolution::pending(),
            Some(RetryDecision::Redeliver { clone, not_before }) => {
                match session
                    .schedule_redelivery(received, &clone, not_before)
                    .await
                {
                    Ok(()) => {
                        info!(
                            retries = clone.retries(),
                            scheduled_for = %not_before.format("%Y-%m-%d %H:%M:%S UTC"),
                            "Message scheduled for redelivery"
                        );
                        Resolution::settled(Settlement::Redelivered)
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to schedule message for redelivery");
                        Resolution::settled(Settlement::Abandoned)
                    }
                }
            }
            Some(RetryDecision::DeadLetter { reason, notify }) => {
                match session.dead_letter(received, &reason).await {
                    Ok(()) => {
                        warn!(reason = %reason, "Message dead-lettered");
                        let notified = notify
                            && self
                                .notifier
                                .notify(&received.message, received.correlation_id())
                                .await;
                        Resolution {
                            settlement: Settlement::DeadLettered,
                            notified,
                        }
                    }
                    Err(e) => {
                        error!(error = %e, reason = %reason, "Failed to dead-letter message");
                        Resolution::settled(Settlement::Abandoned)
                    }
                }
            }
        }
    }
}
