//! Queue backend abstraction layer.
//!
//! The dispatcher talks to the callback subscription through a session opened
//! once per pass. A session receives a bounded batch under peek-lock and
//! settles each received message exactly once: complete, dead-letter or
//! replace it with a delayed redelivery clone. Messages that are never settled
//! return to the queue when their lock (visibility timeout) expires.
//!
//! # Example
//!
//! ```ignore
//! let backend = SqsBackend::new(&config.bus).await?;
//! let session = backend.open_session().await?;
//! let batch = session.receive_batch(10).await?;
//! for message in &batch {
//!     session.complete(message).await?;
//! }
//! session.close().await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CallbackMessage, ReceivedMessage};

pub mod errors;
pub mod memory;
pub mod sqs;

pub use errors::QueueBackendError;
pub use memory::InMemoryQueue;
pub use sqs::SqsBackend;

/// Opens per-pass sessions against the callback subscription.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    type Session: QueueSession;

    /// Acquires the connection and subscription handles for one pass.
    async fn open_session(&self) -> Result<Self::Session, QueueBackendError>;
}

/// Handles held for the duration of one pass.
#[async_trait]
pub trait QueueSession: Send + Sync {
    /// Receives up to `max_messages` messages under peek-lock.
    async fn receive_batch(
        &self,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueBackendError>;

    /// Removes a message from the subscription.
    async fn complete(&self, message: &ReceivedMessage) -> Result<(), QueueBackendError>;

    /// Moves a message to the dead-letter queue.
    async fn dead_letter(
        &self,
        message: &ReceivedMessage,
        reason: &str,
    ) -> Result<(), QueueBackendError>;

    /// Publishes `clone` for delivery no earlier than `not_before` and
    /// releases `message` as a single settlement.
    async fn schedule_redelivery(
        &self,
        message: &ReceivedMessage,
        clone: &CallbackMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), QueueBackendError>;

    /// Releases the session handles.
    async fn close(&self) -> Result<(), QueueBackendError>;
}
