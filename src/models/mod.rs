mod message;
pub use message::*;

mod outcome;
pub use outcome::*;

mod retry;
pub use retry::*;

mod settlement;
pub use settlement::*;

mod secret_string;
pub use secret_string::*;

mod error;
pub use error::*;
