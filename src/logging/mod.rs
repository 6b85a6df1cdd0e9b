//! ## Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_MODE: "stdout" (default) or "file"
//! - LOG_LEVEL: log level ("trace", "debug", "info", "warn", "error"); default is "info".
//!   `RUST_LOG` takes precedence when set.
//! - LOG_FILE_PATH: when using file mode, the path of the log file (default "logs/service-callback.log")

use chrono::Utc;
use std::{
    env,
    fs::{create_dir_all, File, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_LOG_FILE_PATH, DEFAULT_LOG_LEVEL, DEFAULT_LOG_MODE};

/// Appends the UTC date to the log file name, replacing a trailing `.log`.
pub fn compute_rolled_file_path(base_file_path: &str, date_str: &str) -> String {
    match base_file_path.strip_suffix(".log") {
        Some(trimmed) => format!("{}-{}.log", trimmed, date_str),
        None => format!("{}-{}.log", base_file_path, date_str),
    }
}

/// Normalizes a configured level, falling back to "info" for unknown values.
fn parse_level(log_level: &str) -> &'static str {
    match log_level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => DEFAULT_LOG_LEVEL,
    }
}

/// Opens the dated log file for appending. Passes of the same day share a file.
fn open_log_file(rolled_file_path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(rolled_file_path).parent() {
        create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(rolled_file_path)
}

pub fn setup_logging() {
    let log_mode = env::var("LOG_MODE").unwrap_or_else(|_| DEFAULT_LOG_MODE.to_string());
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(&log_level)));

    if log_mode.to_lowercase() == "file" {
        let base_file_path =
            env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE_PATH.to_string());
        let date_str = Utc::now().format("%Y-%m-%d").to_string();
        let rolled_file_path = compute_rolled_file_path(&base_file_path, &date_str);

        let log_file = open_log_file(&rolled_file_path)
            .unwrap_or_else(|e| panic!("Unable to create log file {}: {}", rolled_file_path, e));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .try_init()
            .expect("Failed to initialize file logger");
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .expect("Failed to initialize stdout logger");
    }

    info!(mode = %log_mode, level = %log_level, "Logging is successfully configured");
}
