use thiserror::Error;

use super::ConfigError;
use crate::queues::QueueBackendError;

/// Errors that abort a whole pass. Per-message failures never surface here.
#[derive(Error, Debug)]
pub enum DispatcherError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueBackendError),

    #[error("Service initialization error: {0}")]
    ServiceInit(String),

    #[error("Batch processing panicked: {0}")]
    Panicked(String),
}
