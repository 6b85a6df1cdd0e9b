/// Maximum number of messages a single SQS ReceiveMessage call returns.
pub const SQS_MAX_RECEIVE_BATCH: usize = 10;

/// Maximum per-message delivery delay supported by SQS (15 minutes).
pub const SQS_MAX_DELAY_SECONDS: i64 = 900;

/// Long-poll wait used when draining the subscription.
pub const SQS_RECEIVE_WAIT_SECONDS: i32 = 1;

/// Message attribute carrying the correlation id.
pub const ATTRIBUTE_CORRELATION_ID: &str = "correlationId";

/// Message attribute carrying the redelivery target time for multi-hop delays.
pub const ATTRIBUTE_TARGET_SCHEDULED_ON: &str = "target_scheduled_on";

/// Message attribute recording why a message was dead-lettered.
pub const ATTRIBUTE_DEAD_LETTER_REASON: &str = "deadLetterReason";

/// Suffix appended to the subscription name when no dead-letter queue is configured.
pub const DEFAULT_DEAD_LETTER_SUFFIX: &str = "-dead-letter";
