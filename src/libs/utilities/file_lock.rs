//! Advisory cross-process locks on sidecar files.

use crate::log_debug;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// An exclusive `flock`-style lock, released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Blocks until an exclusive lock on `path` is held, creating the file (and its parent
    /// directory) if needed.
    pub fn acquire(path: &Path) -> io::Result<FileLock> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).truncate(false).write(true).open(path)?;
        file.lock_exclusive()?;
        log_debug!("[Lock] Acquired {}", path.display());
        Ok(FileLock { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log_debug!("[Lock] Failed to release {}: {}", self.path.display(), e);
        }
    }
}
