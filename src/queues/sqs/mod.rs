//! AWS SQS implementation of the queue backend.

mod backend;
mod session;

pub use backend::SqsBackend;
pub use session::SqsSession;
