use serde::Serialize;
use strum::Display;

/// Terminal state of a received message within one pass.
///
/// Every message leaves the pass in exactly one non-`Pending` state, apart
/// from the success path whose `Pending` is resolved by the final completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Settlement {
    /// No settlement action issued yet.
    Pending,
    /// Removed from the subscription after a successful delivery.
    Completed,
    /// Moved to the dead-letter queue.
    DeadLettered,
    /// Replaced by a delayed clone carrying the next retry count.
    Redelivered,
    /// Settlement failed; the bus lock expiry decides the message's fate.
    Abandoned,
}

impl Settlement {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Per-pass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub received: usize,
    pub completed: usize,
    pub dead_lettered: usize,
    pub redelivered: usize,
    pub abandoned: usize,
    pub notifications_sent: usize,
}

impl BatchReport {
    pub fn record(&mut self, settlement: Settlement) {
        match settlement {
            Settlement::Completed => self.completed += 1,
            Settlement::DeadLettered => self.dead_lettered += 1,
            Settlement::Redelivered => self.redelivered += 1,
            Settlement::Abandoned | Settlement::Pending => self.abandoned += 1,
        }
    }

    /// Number of messages that reached a settlement state.
    pub fn settled(&self) -> usize {
        self.completed + self.dead_lettered + self.redelivered + self.abandoned
    }
}
