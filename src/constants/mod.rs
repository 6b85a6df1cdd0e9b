//! Constants used across the dispatcher.

mod worker;
pub use worker::*;

mod message;
pub use message::*;

mod bus;
pub use bus::*;

mod http_client;
pub use http_client::*;

mod logging;
pub use logging::*;
