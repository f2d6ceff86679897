//! # Backup Store
//!
//! Timestamped, checksummed snapshots of configuration files, taken immediately before
//! every mutating write.
//!
//! Each source file gets its own registry (`<file-name>.backups.json`) listing its
//! snapshots oldest first. Snapshots are named `<file-name>.backup-<unix-ts>-<8-hex>` and
//! live next to the source file, or in a per-source subdirectory of a configured backup
//! directory. When a registry grows past its cap, the oldest snapshots (by creation time)
//! are evicted first.

use crate::error::MutationError;
use crate::libs::atomic_writer::AtomicWriter;
use crate::libs::utilities::checksum::sha256_hex;
use crate::libs::utilities::file_operations::read_text;
use crate::libs::utilities::path_helpers::file_name_of;
use crate::schemas::backup_record::{BackupRecord, BackupRegistry};
use crate::{log_debug, log_info, log_warn};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Creates, lists, restores and evicts backups for configuration files.
#[derive(Debug, Clone)]
pub struct BackupStore {
    /// Shared backup directory; `None` keeps backups next to each source file.
    backup_dir: Option<PathBuf>,
    /// Maximum number of snapshots retained per source file.
    cap: usize,
}

impl BackupStore {
    /// # Arguments
    /// * `backup_dir`: Optional shared directory for snapshots.
    /// * `cap`: Retained snapshots per file; values below 1 are raised to 1.
    pub fn new(backup_dir: Option<PathBuf>, cap: usize) -> Self {
        Self { backup_dir, cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Directory holding the snapshots and registry for `source`.
    ///
    /// With a shared backup directory, every source gets a subdirectory named after the
    /// hash of its absolute path, so two `.htaccess` files never share a registry.
    pub fn dir_for(&self, source: &Path) -> PathBuf {
        match &self.backup_dir {
            Some(dir) => {
                let absolute = fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
                let digest = sha256_hex(absolute.to_string_lossy().as_bytes());
                dir.join(&digest[..8])
            },
            None => match source.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    fn registry_path(&self, source: &Path) -> PathBuf {
        self.dir_for(source).join(format!("{}.backups.json", file_name_of(source)))
    }

    /// Snapshots `source` and registers the backup, evicting the oldest beyond the cap.
    ///
    /// Every call writes a new snapshot, even for content identical to the newest one.
    ///
    /// # Errors
    /// `MutationError::Io` when the source cannot be read or the snapshot cannot be written.
    pub fn create(&self, source: &Path) -> Result<BackupRecord, MutationError> {
        let content = read_text(source).map_err(|e| MutationError::io(source, e))?;
        let checksum = sha256_hex(content.as_bytes());
        let mut registry = self.load_registry(source)?;

        let created_at = Utc::now();
        let timestamp = created_at.timestamp();
        let base_name = format!("{}.backup-{}-{}", file_name_of(source), timestamp, &checksum[..8]);
        let mut backup_path = self.dir_for(source).join(&base_name);
        // Same content within the same second: `.1`, `.2`, ...
        let mut sequence = 0u32;
        while backup_path.exists() {
            sequence += 1;
            backup_path = self.dir_for(source).join(format!("{base_name}.{sequence}"));
        }

        AtomicWriter::write(&backup_path, &content)
            .map_err(|e| MutationError::io(&backup_path, e))?;

        let record = BackupRecord {
            source_path: source.to_path_buf(),
            backup_path,
            timestamp,
            created_at,
            size: content.len() as u64,
            checksum,
            content,
        };

        registry.records.push(record.clone());
        registry.records.sort_by_key(|r| r.created_at);
        self.evict_overflow(&mut registry);
        self.save_registry(source, &registry)?;

        log_info!(
            "[Backup] Saved {} ({} bytes)",
            record.backup_path.display().to_string().cyan(),
            record.size
        );
        Ok(record)
    }

    /// Writes the record's content back over its source path, atomically.
    ///
    /// Does not validate the restored file; that is the caller's job.
    pub fn restore(&self, record: &BackupRecord) -> Result<(), MutationError> {
        let content = if record.content.is_empty() && record.size > 0 {
            self.read_snapshot(record)?
        } else {
            record.content.clone()
        };

        AtomicWriter::write(&record.source_path, &content)
            .map_err(|e| MutationError::io(&record.source_path, e))?;

        log_info!(
            "[Backup] Restored {} from {}",
            record.source_path.display().to_string().yellow(),
            record.backup_path.display()
        );
        Ok(())
    }

    /// All intact backups of `source`, newest first, with content loaded.
    ///
    /// Snapshots that vanished from disk or no longer match their checksum are skipped.
    pub fn list(&self, source: &Path) -> Result<Vec<BackupRecord>, MutationError> {
        let registry = self.load_registry(source)?;
        let mut records = Vec::with_capacity(registry.records.len());

        for mut record in registry.records.into_iter().rev() {
            match self.read_snapshot(&record) {
                Ok(content) => {
                    record.content = content;
                    records.push(record);
                },
                Err(e) => {
                    log_warn!(
                        "[Backup] Ignoring unusable backup {}: {}",
                        record.backup_path.display().to_string().red(),
                        e
                    );
                },
            }
        }
        Ok(records)
    }

    /// The newest intact backup of `source`, if any.
    pub fn latest(&self, source: &Path) -> Result<Option<BackupRecord>, MutationError> {
        Ok(self.list(source)?.into_iter().next())
    }

    /// Deletes every backup of `source` together with its registry.
    ///
    /// # Returns
    /// The number of snapshot files removed.
    pub fn cleanup(&self, source: &Path) -> Result<usize, MutationError> {
        let registry = self.load_registry(source)?;
        let mut removed = 0;

        for record in &registry.records {
            match fs::remove_file(&record.backup_path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => return Err(MutationError::io(&record.backup_path, e)),
            }
        }

        let registry_path = self.registry_path(source);
        match fs::remove_file(&registry_path) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => return Err(MutationError::io(&registry_path, e)),
        }

        log_info!(
            "[Backup] Removed {} backup(s) of {}",
            removed,
            source.display().to_string().cyan()
        );
        Ok(removed)
    }

    /// Reads a snapshot back and checks it against the recorded checksum.
    fn read_snapshot(&self, record: &BackupRecord) -> Result<String, MutationError> {
        let content =
            read_text(&record.backup_path).map_err(|e| MutationError::io(&record.backup_path, e))?;
        if sha256_hex(content.as_bytes()) != record.checksum {
            return Err(MutationError::io(
                &record.backup_path,
                io::Error::new(io::ErrorKind::InvalidData, "checksum mismatch"),
            ));
        }
        Ok(content)
    }

    /// Drops the oldest records (and their files) until the registry fits the cap.
    fn evict_overflow(&self, registry: &mut BackupRegistry) {
        while registry.records.len() > self.cap {
            let evicted = registry.records.remove(0);
            let still_referenced =
                registry.records.iter().any(|r| r.backup_path == evicted.backup_path);
            if still_referenced {
                continue;
            }
            match fs::remove_file(&evicted.backup_path) {
                Ok(()) => log_debug!(
                    "[Backup] Evicted {}",
                    evicted.backup_path.display().to_string().dimmed()
                ),
                Err(e) => log_warn!(
                    "[Backup] Could not delete evicted backup {}: {}",
                    evicted.backup_path.display(),
                    e
                ),
            }
        }
    }

    fn load_registry(&self, source: &Path) -> Result<BackupRegistry, MutationError> {
        let path = self.registry_path(source);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(self.scan_directory(source)),
            Err(e) => return Err(MutationError::io(&path, e)),
        };

        match serde_json::from_str::<BackupRegistry>(&raw) {
            Ok(mut registry) => {
                registry.records.sort_by_key(|r| r.created_at);
                Ok(registry)
            },
            Err(e) => {
                log_warn!(
                    "[Backup] Registry {} is unreadable ({}); rebuilding from backup files",
                    path.display().to_string().red(),
                    e
                );
                Ok(self.scan_directory(source))
            },
        }
    }

    fn save_registry(&self, source: &Path, registry: &BackupRegistry) -> Result<(), MutationError> {
        let path = self.registry_path(source);
        let json = serde_json::to_string_pretty(registry).map_err(|e| {
            MutationError::io(&path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        AtomicWriter::write(&path, &json).map_err(|e| MutationError::io(&path, e))
    }

    /// Rebuilds a registry from `<file-name>.backup-<ts>-<hex>` files on disk.
    fn scan_directory(&self, source: &Path) -> BackupRegistry {
        let dir = self.dir_for(source);
        let prefix = format!("{}.backup-", file_name_of(source));
        let mut records = Vec::new();

        for entry in walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(rest) = name.strip_prefix(&prefix) else { continue };
            let Some((ts, short)) = rest.split_once('-') else { continue };
            let short = short.split_once('.').map_or(short, |(hex, _)| hex);
            if short.len() != 8 || !short.chars().all(|c| c.is_ascii_hexdigit()) {
                continue;
            }
            let Ok(timestamp) = ts.parse::<i64>() else { continue };
            let Ok(content) = read_text(entry.path()) else { continue };
            let created_at = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);

            records.push(BackupRecord {
                source_path: source.to_path_buf(),
                backup_path: entry.path().to_path_buf(),
                timestamp,
                created_at,
                size: content.len() as u64,
                checksum: sha256_hex(content.as_bytes()),
                content: String::new(),
            });
        }

        records.sort_by_key(|r| r.created_at);
        BackupRegistry { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(".htaccess");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn create_writes_named_snapshot_with_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "RewriteEngine On\n");
        let store = BackupStore::new(None, 3);

        let record = store.create(&source).unwrap();

        let name = file_name_of(&record.backup_path);
        assert!(name.starts_with(".htaccess.backup-"));
        assert!(name.ends_with(record.short_checksum()));
        assert_eq!(record.checksum, sha256_hex(b"RewriteEngine On\n"));
        assert_eq!(fs::read_to_string(&record.backup_path).unwrap(), "RewriteEngine On\n");
        assert_eq!(record.size, 17);
    }

    #[test]
    fn create_fails_for_unreadable_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::new(None, 3);
        let err = store.create(&dir.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, MutationError::Io { .. }));
    }

    #[test]
    fn cap_keeps_most_recent_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "v0\n");
        let store = BackupStore::new(None, 3);

        let mut created = Vec::new();
        for version in 0..4 {
            fs::write(&source, format!("v{version}\n")).unwrap();
            created.push(store.create(&source).unwrap());
        }

        let listed = store.list(&source).unwrap();
        assert_eq!(listed.len(), 3);
        let contents: Vec<_> = listed.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["v3\n", "v2\n", "v1\n"]);
        assert!(!created[0].backup_path.exists());
    }

    #[test]
    fn cap_holds_for_unchanged_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "same\n");
        let store = BackupStore::new(None, 3);

        let created: Vec<_> = (0..4).map(|_| store.create(&source).unwrap()).collect();

        let listed = store.list(&source).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(!created[0].backup_path.exists());
        let mut paths: Vec<_> = listed.iter().map(|r| r.backup_path.clone()).collect();
        paths.dedup();
        assert_eq!(paths.len(), 3);
        assert_eq!(listed[0].backup_path, created[3].backup_path);

        fs::remove_file(store.registry_path(&source)).unwrap();
        assert_eq!(store.list(&source).unwrap().len(), 3);
    }

    #[test]
    fn restore_puts_snapshot_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "original\n");
        let store = BackupStore::new(None, 3);
        let record = store.create(&source).unwrap();

        fs::write(&source, "broken").unwrap();
        store.restore(&record).unwrap();

        assert_eq!(fs::read_to_string(&source).unwrap(), "original\n");
    }

    #[test]
    fn tampered_snapshot_is_skipped_by_list() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "one\n");
        let store = BackupStore::new(None, 3);
        let record = store.create(&source).unwrap();

        fs::write(&record.backup_path, "tampered").unwrap();

        assert!(store.list(&source).unwrap().is_empty());
    }

    #[test]
    fn shared_directory_separates_sources() {
        let site_a = tempfile::tempdir().unwrap();
        let site_b = tempfile::tempdir().unwrap();
        let backups = tempfile::tempdir().unwrap();
        let a = seeded(site_a.path(), "a\n");
        let b = seeded(site_b.path(), "b\n");
        let store = BackupStore::new(Some(backups.path().to_path_buf()), 3);

        store.create(&a).unwrap();
        store.create(&b).unwrap();

        assert_ne!(store.dir_for(&a), store.dir_for(&b));
        assert_eq!(store.list(&a).unwrap()[0].content, "a\n");
        assert_eq!(store.list(&b).unwrap()[0].content, "b\n");
    }

    #[test]
    fn cleanup_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "x\n");
        let store = BackupStore::new(None, 3);
        store.create(&source).unwrap();
        fs::write(&source, "y\n").unwrap();
        store.create(&source).unwrap();

        assert_eq!(store.cleanup(&source).unwrap(), 2);
        assert!(store.list(&source).unwrap().is_empty());
        assert_eq!(fs::read_to_string(&source).unwrap(), "y\n");
    }

    #[test]
    fn missing_registry_is_rebuilt_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(dir.path(), "z\n");
        let store = BackupStore::new(None, 3);
        let record = store.create(&source).unwrap();

        fs::remove_file(store.registry_path(&source)).unwrap();

        let listed = store.list(&source).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].backup_path, record.backup_path);
    }
}
