//! This module contains the function to log service information at startup.
use std::env;
use tracing::info;

/// Logs service information at startup
pub fn log_service_info() {
    let service_name = env!("CARGO_PKG_NAME");
    let service_version = env!("CARGO_PKG_VERSION");

    info!("=== Service Callback Dispatcher Starting ===");
    info!(service_name = %service_name, service_version = %service_version, "service");
    info!(rust_version = %env!("CARGO_PKG_RUST_VERSION"), "rust version");
    info!(platform = %env::consts::OS, architecture = %env::consts::ARCH, "platform");

    if let Ok(rust_log) = env::var("RUST_LOG") {
        info!(log_level = %rust_log, "log level");
    }

    info!(
        started_at = %chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        "started at"
    );
}
