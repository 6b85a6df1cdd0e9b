/// Maximum number of redeliveries before a message is dead-lettered.
/// The sixth failed attempt overall (retries == 5) dead-letters the message.
pub const MAX_RETRIES: u32 = 5;

/// Default number of messages drained from the subscription in one pass.
pub const DEFAULT_PROCESS_MESSAGES_COUNT: usize = 10;

/// Default delay before a retried message is redelivered.
pub const DEFAULT_DELAY_MESSAGE_MINUTES: i64 = 15;

/// Lower bound (inclusive) of generated correlation ids.
pub const CORRELATION_ID_MIN: u32 = 100_000;

/// Upper bound (exclusive) of generated correlation ids.
pub const CORRELATION_ID_MAX: u32 = 999_999;
