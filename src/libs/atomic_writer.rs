//! Write-temp-then-rename primitives used by every mutation in the crate.
//!
//! A write first lands in `<file-name>.tmp-<random>` next to the destination, is flushed
//! and fsynced, and is then renamed over the destination. Readers therefore see either the
//! old content or the complete new content, never a truncated file. A staged write that is
//! dropped without being committed removes its temp file.

use crate::libs::utilities::file_operations::read_text;
use crate::libs::utilities::path_helpers::file_name_of;
use crate::log_debug;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stateless namespace for the atomic write operations.
pub struct AtomicWriter;

impl AtomicWriter {
    /// Atomically replaces (or creates) `path` with `content`.
    ///
    /// # Errors
    /// Any failure to create, write, sync or rename the temp file. On a rename failure the
    /// temp file is deleted and the destination keeps its previous content.
    pub fn write(path: &Path, content: &str) -> io::Result<()> {
        Self::stage(path, content)?.commit()
    }

    /// Writes `content` to a temp file beside `path` without touching `path` itself.
    ///
    /// The temp file inherits the destination's permissions when the destination exists,
    /// so a `0640` `wp-config.php` stays `0640` after the rename.
    pub fn stage(path: &Path, content: &str) -> io::Result<StagedWrite> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let prefix = format!("{}.tmp-", file_name_of(path));
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .rand_bytes(8)
            .tempfile_in(&parent)?;

        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.as_file().sync_all()?;

        if let Ok(metadata) = fs::metadata(path) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }

        log_debug!(
            "[Atomic] Staged {} bytes for {} in {}",
            content.len(),
            path.display().to_string().cyan(),
            temp.path().display().to_string().dimmed()
        );

        Ok(StagedWrite { temp, destination: path.to_path_buf() })
    }

    /// Re-reads `path` and compares it byte-for-byte with `expected`.
    pub fn verify_roundtrip(path: &Path, expected: &str) -> bool {
        match read_text(path) {
            Ok(actual) => actual == expected,
            Err(e) => {
                log_debug!("[Atomic] Round-trip read of {} failed: {}", path.display(), e);
                false
            },
        }
    }
}

/// The commit step of a mutation: puts `content` in place of the file at `path`.
pub trait FileCommitter {
    fn commit(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// Commits through [`AtomicWriter::write`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicCommitter;

impl FileCommitter for AtomicCommitter {
    fn commit(&self, path: &Path, content: &str) -> io::Result<()> {
        AtomicWriter::write(path, content)
    }
}

/// A fully written temp file waiting to be renamed over its destination.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Renames the temp file over the destination.
    pub fn commit(self) -> io::Result<()> {
        let destination = self.destination;
        // On failure the returned `PersistError` owns the temp file and deletes it on drop.
        self.temp.persist(&destination).map_err(|e| e.error)?;
        log_debug!("[Atomic] Committed {}", destination.display().to_string().green());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::OpenOptions;

    fn temp_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().contains(".tmp-"))
            .count()
    }

    #[test]
    fn write_replaces_content_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wp-config.php");
        fs::write(&path, "old").unwrap();

        AtomicWriter::write(&path, "new content").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
        assert!(AtomicWriter::verify_roundtrip(&path, "new content"));
        assert!(!AtomicWriter::verify_roundtrip(&path, "old"));
        assert_eq!(temp_leftovers(dir.path()), 0);
    }

    #[test]
    fn write_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        AtomicWriter::write(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn truncated_temp_never_reaches_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".htaccess");
        fs::write(&path, "# original\n").unwrap();

        let staged = AtomicWriter::stage(&path, "# replacement that never lands\n").unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        assert!(
            file_name_of(&temp_path).starts_with(".htaccess.tmp-"),
            "unexpected temp name {}",
            temp_path.display()
        );

        // Simulate a crash mid-write: the temp file is cut short and never renamed.
        OpenOptions::new().write(true).truncate(true).open(&temp_path).unwrap();
        drop(staged);

        assert_eq!(fs::read_to_string(&path).unwrap(), "# original\n");
        assert!(!temp_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_of_destination_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wp-config.php");
        fs::write(&path, "<?php\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        AtomicWriter::write(&path, "<?php\n// changed\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn destination_holds_old_or_new_content_only(
            old in "\\PC{0,512}",
            new in "\\PC{0,512}",
            committed in any::<bool>(),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("php.ini");
            fs::write(&path, &old).unwrap();

            let staged = AtomicWriter::stage(&path, &new).unwrap();
            prop_assert_eq!(fs::read_to_string(&path).unwrap(), old.clone());
            if committed {
                staged.commit().unwrap();
            } else {
                drop(staged);
            }

            let expected = if committed { &new } else { &old };
            prop_assert_eq!(&fs::read_to_string(&path).unwrap(), expected);
            prop_assert_eq!(temp_leftovers(dir.path()), 0);
        }
    }
}
