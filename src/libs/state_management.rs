// Persistent key-value settings store backed by `state.json`.
//
// The store is the narrow `get`/`set` interface shared with the external admin layer:
// it remembers the last applied preset and strategy and the user's custom preset values.
// Every `set` rewrites the whole file atomically as pretty-printed JSON.

use crate::error::ConfigError;
use crate::libs::atomic_writer::AtomicWriter;
use crate::schemas::state_file::StoreState;
use crate::log_debug;
use colored::Colorize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File-backed key-value store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    state: StoreState,
}

impl SettingsStore {
    /// Loads the store from `path`, starting empty when the file does not exist.
    ///
    /// # Arguments
    /// * `path`: Location of `state.json`. Nothing is written until the first `set`.
    ///
    /// # Errors
    /// `ConfigError::Read` if the file exists but cannot be read, `ConfigError::Json` if it
    /// is not a valid store.
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let state = match fs::read_to_string(path) {
            Ok(contents) => {
                let state: StoreState = serde_json::from_str(&contents)
                    .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
                log_debug!(
                    "[State] Loaded {} key(s) from {}",
                    state.values.len(),
                    path.display().to_string().cyan()
                );
                state
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log_debug!("[State] {} not found; starting empty", path.display());
                StoreState::default()
            },
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        Ok(SettingsStore { path: path.to_path_buf(), state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value stored under `key`, or `default` when it is absent or has a
    /// different shape than `T`.
    pub fn get<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.state
            .values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.values.contains_key(key)
    }

    /// Stores `value` under `key` and persists the store.
    ///
    /// # Errors
    /// `ConfigError::Json` if `value` cannot be serialized, `ConfigError::Write` if the
    /// file cannot be written.
    pub fn set<T>(&mut self, key: &str, value: T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(value)
            .map_err(|source| ConfigError::Json { path: self.path.clone(), source })?;
        self.state.values.insert(key.to_string(), value);
        self.save()
    }

    /// Removes `key` and persists the store. Returns whether the key existed.
    pub fn remove(&mut self, key: &str) -> Result<bool, ConfigError> {
        let existed = self.state.values.remove(key).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn save(&self) -> Result<(), ConfigError> {
        let serialized = serde_json::to_string_pretty(&self.state)
            .map_err(|source| ConfigError::Json { path: self.path.clone(), source })?;
        AtomicWriter::write(&self.path, &serialized)
            .map_err(|source| ConfigError::Write { path: self.path.clone(), source })?;
        log_debug!("[State] Saved {}", self.path.display().to_string().green());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::state_file::{KEY_CUSTOM_PRESET, KEY_LAST_PRESET};
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_starts_empty_and_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_LAST_PRESET, "none".to_string()), "none");
        assert!(!path.exists());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = SettingsStore::open(&path).unwrap();
        store.set(KEY_LAST_PRESET, "medium").unwrap();
        let custom: BTreeMap<String, String> =
            [("memory_limit".to_string(), "768M".to_string())].into_iter().collect();
        store.set(KEY_CUSTOM_PRESET, &custom).unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get(KEY_LAST_PRESET, String::new()), "medium");
        assert_eq!(reopened.get(KEY_CUSTOM_PRESET, BTreeMap::<String, String>::new()), custom);
    }

    #[test]
    fn wrong_shape_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open(&dir.path().join("state.json")).unwrap();
        store.set("count", "not a number").unwrap();
        assert_eq!(store.get("count", 7u32), 7);
        assert!(store.remove("count").unwrap());
        assert!(!store.contains("count"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SettingsStore::open(&path), Err(ConfigError::Json { .. })));
    }
}
