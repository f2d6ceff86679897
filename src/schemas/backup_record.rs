use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A frozen snapshot of a configuration file taken right before a mutating write.
///
/// The metadata is persisted in the per-file backup registry; `content` is only
/// populated in memory (after `create` or when `list` reads the backup file back).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupRecord {
    /// The file that was snapshotted.
    pub source_path: PathBuf,
    /// Where the snapshot lives: `<file-name>.backup-<unix-ts>-<8-hex>`.
    pub backup_path: PathBuf,
    /// Unix seconds, as embedded in the backup file name.
    pub timestamp: i64,
    /// Full-precision creation time; eviction order is by this field.
    pub created_at: DateTime<Utc>,
    pub size: u64,
    /// SHA-256 of the snapshot, lowercase hex.
    pub checksum: String,
    #[serde(skip)]
    pub content: String,
}

impl BackupRecord {
    /// First 8 hex characters of the checksum, as used in the file name.
    pub fn short_checksum(&self) -> &str {
        let end = self.checksum.len().min(8);
        &self.checksum[..end]
    }
}

/// On-disk registry of backups for one source file, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupRegistry {
    pub records: Vec<BackupRecord>,
}
