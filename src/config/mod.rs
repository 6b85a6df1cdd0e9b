//! Configuration for the dispatcher, loaded from environment variables.

mod dispatcher_config;
pub use dispatcher_config::*;

mod email_config;
pub use email_config::*;
