mod base64;
pub use base64::*;

mod correlation;
pub use correlation::*;

mod http_client;
pub use http_client::*;

mod service_info_log;
pub use service_info_log::*;

mod time;
pub use time::*;

mod panic;
pub use panic::*;
