//! Tracing helpers shared by the dispatcher jobs.

mod message_tracing;
pub use message_tracing::*;
