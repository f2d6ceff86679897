use crate::error::ConfigError;
use crate::schemas::app_config::AppConfig;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::Path;

/// Reads and deserializes a YAML file.
///
/// # Type Parameters
/// * `T`: Target type; must implement `DeserializeOwned`.
///
/// # Returns
/// * `Ok(Some(T))` when the file exists and parses.
/// * `Ok(None)` when the file does not exist.
/// * `Err(ConfigError)` when it exists but cannot be read or parsed.
pub fn load_yaml<T>(path: &Path) -> Result<Option<T>, ConfigError>
where
    T: DeserializeOwned,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };
    if contents.trim().is_empty() {
        log_debug!("[Config] {} is empty", path.display());
        return serde_yaml::from_str("{}")
            .map(Some)
            .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source });
    }
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
}

/// Loads `config.yaml`, falling back to defaults when the file is absent.
///
/// # Arguments
/// * `path`: Resolved path to the configuration file.
///
/// # Returns
/// The parsed [`AppConfig`], or an error if the file exists but is malformed.
pub fn load_app_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match load_yaml::<AppConfig>(path)? {
        Some(config) => {
            log_info!("[Config] Using configuration file: {}", path.display().to_string().cyan());
            log_debug!("[Config] Loaded: {:?}", config);
            Ok(config)
        },
        None => {
            log_warn!(
                "[Config] {} not found; using defaults rooted at the current directory",
                path.display().to_string().yellow()
            );
            Ok(AppConfig::default())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(load_app_config(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "liveness: [unclosed\n").unwrap();
        assert!(matches!(load_app_config(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn values_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "site_root: /var/www/html\nbackups:\n  dir: /var/backups/site\n").unwrap();
        let config = load_app_config(&path).unwrap();
        assert_eq!(config.site_root, "/var/www/html");
        assert_eq!(config.backups.dir.as_deref(), Some("/var/backups/site"));
    }
}
