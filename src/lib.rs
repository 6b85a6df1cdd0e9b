//! Service callback dispatcher.
//!
//! Drains a bounded batch from the service callback subscription, delivers
//! each payload to the service's callback URL with a leased S2S token and
//! settles every message exactly once: completed, redelivered later with an
//! incremented retry count, or dead-lettered.

pub mod config;
pub mod constants;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod observability;
pub mod queues;
pub mod services;
pub mod utils;
