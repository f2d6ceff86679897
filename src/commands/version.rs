use confguard::log_info;
use colored::Colorize;

/// Prints the version compiled into the binary.
pub fn run() {
    log_info!(
        "{} {}",
        env!("CARGO_PKG_NAME").bold(),
        env!("CARGO_PKG_VERSION").green()
    );
}
