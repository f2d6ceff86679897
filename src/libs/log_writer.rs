//! # Rotating Log Writer
//!
//! Append-only text logs (query log, SMTP log, debug log) that rotate by size. When an
//! append would push a non-empty log to its threshold, the active file becomes `<log>.1`
//! (replacing any older `.1`) and a fresh active file is started. Only one generation is
//! ever kept by rotation itself; older numbered generations left by other tools are removed
//! by [`RotatingLogWriter::cleanup_old_generations`].
//!
//! All appends to the same path are serialized through an exclusive lock on `<log>.lock`.

use crate::libs::utilities::file_lock::FileLock;
use crate::libs::utilities::path_helpers::{file_name_of, with_suffix};
use crate::schemas::app_config::DEFAULT_ROTATION_THRESHOLD;
use crate::schemas::rotation::{AppendOutcome, RotationState};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatingLogWriter {
    threshold: u64,
}

impl Default for RotatingLogWriter {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION_THRESHOLD)
    }
}

impl RotatingLogWriter {
    /// # Arguments
    /// * `threshold`: Size in bytes at which the active file is rotated. Zero is treated as 1.
    pub fn new(threshold: u64) -> Self {
        RotatingLogWriter { threshold: threshold.max(1) }
    }

    /// Appends `content` to `path`, rotating first when
    /// `current_size > 0 && current_size + content.len() >= threshold`.
    ///
    /// # Errors
    /// Any failure to lock, rename, create or write the log file.
    pub fn append(&self, path: &Path, content: &str) -> io::Result<AppendOutcome> {
        if content.is_empty() {
            return Ok(AppendOutcome::default());
        }

        let _lock = FileLock::acquire(&with_suffix(path, ".lock"))?;

        let current = current_size(path);
        let incoming = content.len() as u64;
        let rotated = current > 0 && current + incoming >= self.threshold;
        if rotated {
            self.rotate(path)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(AppendOutcome { rotated, bytes_written: content.len() })
    }

    /// Deletes every `<path>.<N>` generation. The active file is left alone.
    ///
    /// # Returns
    /// The number of generation files removed.
    pub fn cleanup_old_generations(&self, path: &Path) -> io::Result<usize> {
        let mut removed = 0usize;
        for generation in generations(path)? {
            match fs::remove_file(&generation) {
                Ok(()) => {
                    removed += 1;
                    log_debug!("[Logs] Removed {}", generation.display());
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => return Err(e),
            }
        }
        if removed > 0 {
            log_info!(
                "[Logs] Removed {} old generation(s) of {}",
                removed.to_string().bold(),
                path.display().to_string().cyan()
            );
        }
        Ok(removed)
    }

    /// Combined size of the active file and all numbered generations, in bytes.
    pub fn total_size(&self, path: &Path) -> u64 {
        let rotated: u64 = generations(path)
            .unwrap_or_default()
            .iter()
            .map(|generation| current_size(generation))
            .sum();
        current_size(path) + rotated
    }

    pub fn state(&self, path: &Path) -> RotationState {
        RotationState {
            active_path: path.to_path_buf(),
            current_size: current_size(path),
            threshold: self.threshold,
            retained_generations: generations(path).map(|g| g.len()).unwrap_or(0),
        }
    }

    /// Replaces `.1` with the active file and starts an empty active file.
    fn rotate(&self, path: &Path) -> io::Result<()> {
        let first_generation = with_suffix(path, ".1");
        match fs::remove_file(&first_generation) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => {
                log_warn!("[Logs] Could not remove {}: {}", first_generation.display(), e);
                return Err(e);
            },
        }
        fs::rename(path, &first_generation)?;
        File::create(path)?;
        log_info!(
            "[Logs] Rotated {} to {}",
            path.display().to_string().cyan(),
            file_name_of(&first_generation).yellow()
        );
        Ok(())
    }
}

fn current_size(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

/// Paths of `<path>.<digits>` siblings, sorted by generation number.
fn generations(path: &Path) -> io::Result<Vec<PathBuf>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!("{}.", file_name_of(path));

    let entries = match fs::read_dir(&parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut found: Vec<(u64, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let number = name.strip_prefix(&prefix)?;
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some((number.parse().ok()?, entry.path()))
        })
        .collect();
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}
