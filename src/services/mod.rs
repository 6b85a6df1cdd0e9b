//! # Services Module
//!
//! External collaborators of the dispatcher: the identity service that leases
//! S2S tokens, the HTTP callback endpoint and the SMTP server.

mod s2s;
pub use s2s::*;

mod callback;
pub use callback::*;

mod email;
pub use email::*;
