//! Pipeline log helpers.
//!
//! Thin wrappers over `tracing` so the loader, the store and the build steps
//! log with one vocabulary. Output format and filtering are decided by the
//! subscriber the binary installs.

use tracing::{error, info, warn};

/// Log level of a pipeline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Emit `msg` at `level`.
pub fn log(level: LogLevel, msg: impl Into<String>) {
    let msg = msg.into();
    match level {
        LogLevel::Info => info!(target: "poa_csv", "{}", msg),
        LogLevel::Success => info!(target: "poa_csv", status = "ok", "{}", msg),
        LogLevel::Warning => warn!(target: "poa_csv", "{}", msg),
        LogLevel::Error => error!(target: "poa_csv", "{}", msg),
    }
}

pub fn log_info(msg: impl Into<String>) {
    log(LogLevel::Info, msg);
}

pub fn log_success(msg: impl Into<String>) {
    log(LogLevel::Success, msg);
}

pub fn log_warning(msg: impl Into<String>) {
    log(LogLevel::Warning, msg);
}

pub fn log_error(msg: impl Into<String>) {
    log(LogLevel::Error, msg);
}
