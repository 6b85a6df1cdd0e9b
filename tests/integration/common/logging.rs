//! Test logging initialization
//!
//! Uses `std::sync::Once` so that tests can call it freely.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the tracing subscriber for integration tests.
///
/// Configuration is controlled by the `RUST_LOG` environment variable.
/// Default: info-level logs.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .with_target(false)
            .with_ansi(false)
            .try_init();
    });
}
