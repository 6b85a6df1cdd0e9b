//! In-memory queue backend.
//!
//! Simulates a peek-lock subscription: received messages stay in flight until
//! settled or until [`InMemoryQueue::expire_locks`] returns them to the queue.
//! Scheduled redeliveries are held aside until [`InMemoryQueue::release_scheduled`]
//! makes them visible. Every settlement call is recorded per receipt so tests
//! can assert that no message is settled twice.
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::{CallbackMessage, ReceivedMessage};

use super::{QueueBackend, QueueBackendError, QueueSession};

#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetteredMessage {
    pub message: CallbackMessage,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledMessage {
    pub message: CallbackMessage,
    pub not_before: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<CallbackMessage>,
    in_flight: HashMap<String, CallbackMessage>,
    scheduled: Vec<ScheduledMessage>,
    completed: Vec<CallbackMessage>,
    dead_lettered: Vec<DeadLetteredMessage>,
    settlement_calls: HashMap<String, usize>,
    sessions_opened: usize,
    sessions_closed: usize,
    fail_receive: bool,
    fail_complete: bool,
    fail_dead_letter: bool,
    fail_redelivery: bool,
}

impl QueueState {
    fn record_settlement(&mut self, receipt: &str) {
        *self.settlement_calls.entry(receipt.to_string()).or_default() += 1;
    }

    fn take_in_flight(&mut self, receipt: &str) -> Result<CallbackMessage, QueueBackendError> {
        self.in_flight
            .remove(receipt)
            .ok_or_else(|| QueueBackendError::LockLost(receipt.to_string()))
    }
}

/// Shared in-memory subscription. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a message as if a producer had published it.
    pub fn push(&self, message: CallbackMessage) {
        self.state.lock().visible.push_back(message);
    }

    pub fn set_fail_receive(&self, fail: bool) {
        self.state.lock().fail_receive = fail;
    }

    pub fn set_fail_complete(&self, fail: bool) {
        self.state.lock().fail_complete = fail;
    }

    pub fn set_fail_dead_letter(&self, fail: bool) {
        self.state.lock().fail_dead_letter = fail;
    }

    pub fn set_fail_redelivery(&self, fail: bool) {
        self.state.lock().fail_redelivery = fail;
    }

    /// Makes every scheduled redelivery visible, regardless of its time.
    /// Returns the number of released messages.
    pub fn release_scheduled(&self) -> usize {
        let mut state = self.state.lock();
        let released: Vec<_> = state.scheduled.drain(..).collect();
        let count = released.len();
        state
            .visible
            .extend(released.into_iter().map(|scheduled| scheduled.message));
        count
    }

    /// Returns every unsettled in-flight message to the queue.
    pub fn expire_locks(&self) -> usize {
        let mut state = self.state.lock();
        let expired: Vec<_> = state.in_flight.drain().map(|(_, message)| message).collect();
        let count = expired.len();
        state.visible.extend(expired);
        count
    }

    pub fn visible_len(&self) -> usize {
        self.state.lock().visible.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn completed(&self) -> Vec<CallbackMessage> {
        self.state.lock().completed.clone()
    }

    pub fn dead_lettered(&self) -> Vec<DeadLetteredMessage> {
        self.state.lock().dead_lettered.clone()
    }

    pub fn scheduled(&self) -> Vec<ScheduledMessage> {
        self.state.lock().scheduled.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().sessions_closed
    }

    /// Highest number of settlement calls issued for any single receipt.
    pub fn max_settlements_per_receipt(&self) -> usize {
        self.state
            .lock()
            .settlement_calls
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueue {
    type Session = InMemorySession;

    async fn open_session(&self) -> Result<Self::Session, QueueBackendError> {
        self.state.lock().sessions_opened += 1;
        Ok(InMemorySession {
            state: self.state.clone(),
        })
    }
}

#[derive(Debug)]
pub struct InMemorySession {
    state: Arc<Mutex<QueueState>>,
}

#[async_trait]
impl QueueSession for InMemorySession {
    async fn receive_batch(
        &self,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, QueueBackendError> {
        let mut state = self.state.lock();
        if state.fail_receive {
            return Err(QueueBackendError::ReceiveError(
                "receive failure injected".to_string(),
            ));
        }

        let count = max_messages.min(state.visible.len());
        let drained: Vec<CallbackMessage> = state.visible.drain(..count).collect();
        let mut batch = Vec::with_capacity(count);
        for message in drained {
            let receipt = Uuid::new_v4().to_string();
            state.in_flight.insert(receipt.clone(), message.clone());
            batch.push(ReceivedMessage::new(receipt, message));
        }

        debug!(count = batch.len(), "received in-memory batch");
        Ok(batch)
    }

    async fn complete(&self, message: &ReceivedMessage) -> Result<(), QueueBackendError> {
        let mut state = self.state.lock();
        state.record_settlement(&message.receipt);
        if state.fail_complete {
            return Err(QueueBackendError::SettlementError(
                "complete failure injected".to_string(),
            ));
        }
        let completed = state.take_in_flight(&message.receipt)?;
        state.completed.push(completed);
        Ok(())
    }

    async fn dead_letter(
        &self,
        message: &ReceivedMessage,
        reason: &str,
    ) -> Result<(), QueueBackendError> {
        let mut state = self.state.lock();
        state.record_settlement(&message.receipt);
        if state.fail_dead_letter {
            return Err(QueueBackendError::SettlementError(
                "dead-letter failure injected".to_string(),
            ));
        }
        let dead = state.take_in_flight(&message.receipt)?;
        state.dead_lettered.push(DeadLetteredMessage {
            message: dead,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn schedule_redelivery(
        &self,
        message: &ReceivedMessage,
        clone: &CallbackMessage,
        not_before: DateTime<Utc>,
    ) -> Result<(), QueueBackendError> {
        let mut state = self.state.lock();
        state.record_settlement(&message.receipt);
        if state.fail_redelivery {
            return Err(QueueBackendError::SettlementError(
                "redelivery failure injected".to_string(),
            ));
        }
        state.take_in_flight(&message.receipt)?;
        state.scheduled.push(ScheduledMessage {
            message: clone.clone(),
            not_before,
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueBackendError> {
        self.state.lock().sessions_closed += 1;
        Ok(())
    }
}
