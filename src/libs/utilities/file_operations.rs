use crate::log_debug;
use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Reads a configuration file as UTF-8 text, preserving every byte of its content.
///
/// # Returns
/// * `io::Result<String>` - The content, or an error if the file is missing, unreadable
///   or not valid UTF-8 (reported as `InvalidData`).
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8: {}", path.display(), e),
        )
    })
}

/// Checks that `path` exists, is a regular file, and can be opened for writing.
///
/// Opening with `write(true)` and no `truncate` leaves the content untouched.
///
/// # Returns
/// * `Ok(())` when the file is present and writable.
/// * `Err(reason)` with a human-readable reason otherwise.
pub fn check_writable(path: &Path) -> Result<(), String> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(format!("{} does not exist", path.display()));
        },
        Err(e) => return Err(format!("cannot stat {}: {}", path.display(), e)),
    };

    if !metadata.is_file() {
        return Err(format!("{} is not a regular file", path.display()));
    }
    if metadata.permissions().readonly() {
        return Err(format!("{} is read-only", path.display()));
    }

    match OpenOptions::new().write(true).open(path) {
        Ok(_) => {
            log_debug!("[Files] {} is writable", path.display().to_string().dimmed());
            Ok(())
        },
        Err(e) => Err(format!("{} is not writable: {}", path.display(), e)),
    }
}
