use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during queue backend operations.
#[derive(Debug, Error, Serialize, Clone, PartialEq, Eq)]
pub enum QueueBackendError {
    #[error("SQS error: {0}")]
    SqsError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Receive error: {0}")]
    ReceiveError(String),
    #[error("Settlement error: {0}")]
    SettlementError(String),
    #[error("Message lock lost: {0}")]
    LockLost(String),
}
