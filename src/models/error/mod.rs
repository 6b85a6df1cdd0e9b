mod config;
pub use config::*;

mod validation;
pub use validation::*;

mod dispatcher;
pub use dispatcher::*;
