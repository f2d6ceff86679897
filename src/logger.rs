// This file implements the application's logging system.
// It provides macros for different log levels (INFO, WARN, ERROR, DEBUG)
// and handles conditional output, especially for debug messages, with colored terminal output.
// The macros are exported from the library so both the core modules and the `confguard`
// binary log through the same switch.

use colored::Colorize; // Used for adding color to the level tags.
use std::sync::OnceLock; // Ensures the DEBUG_ENABLED flag is initialized exactly once.
use std::sync::atomic::{AtomicBool, Ordering}; // For thread-safe, atomic control of the debug flag.

/// Severity attached to every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

// `log_info!` for general progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Info, &format!($($arg)*)));
}

// `log_warn!` for non-critical issues, e.g. a strategy that was skipped.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Warn, &format!($($arg)*)));
}

// `log_error!` for failures that need attention, e.g. a rollback that could not be written.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => ($crate::logger::emit($crate::logger::Level::Error, &format!($($arg)*)));
}

// `log_debug!` for detailed internal tracing.
// Messages are only formatted and printed if debug mode is enabled via `is_debug_enabled()`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
            $crate::logger::emit($crate::logger::Level::Debug, &format!($($arg)*));
        }
    };
}

// Global flag to control debug logging, ensured to be initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger, setting the global debug mode.
/// This function should be called once at application startup.
///
/// # Arguments
/// * `debug`: If `true`, enables debug logging; otherwise, only info, warn, and error messages are printed.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug)) // Initialize if not already set.
        .store(debug, Ordering::Relaxed); // Update the flag with the provided debug value.

    if debug {
        crate::log_debug!("Logger initialized in DEBUG mode");
    }
}

/// Checks if debug logging is currently enabled.
/// Used primarily by the `log_debug!` macro.
///
/// # Returns
/// * `true` if debug logging is enabled, `false` otherwise.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get() // Attempt to retrieve the AtomicBool.
        .map(|f| f.load(Ordering::Relaxed)) // Load its value if present.
        .unwrap_or(false) // Default to false if `init` was never called.
}

/// Writes one log line to stderr with a colored level tag.
/// Not meant to be called directly; use the `log_*!` macros.
pub fn emit(level: Level, message: &str) {
    let tag = match level {
        Level::Info => "[INFO]".bright_green(),
        Level::Warn => "[WARN]".bright_yellow(),
        Level::Error => "[ERROR]".bright_red(),
        Level::Debug => "[DEBUG]".dimmed(),
    };
    eprintln!("{} {}", tag, message);
}
