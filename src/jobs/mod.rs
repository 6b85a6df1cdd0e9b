//! Dispatcher pipeline: validation, delivery, retry decisions and the
//! batch pass that ties them together.

pub mod validator;

mod dead_letter_notifier;
pub use dead_letter_notifier::*;

mod retry_coordinator;
pub use retry_coordinator::*;

mod batch_orchestrator;
pub use batch_orchestrator::*;
