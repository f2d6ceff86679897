//! # Application Configuration Schema (`config.yaml`)
//!
//! Describes where the governed site's configuration files live and the policy knobs
//! used while mutating them. Every field has a default so an empty file, or no file at
//! all, yields a usable configuration rooted at the current directory.
//!
//! ## Example
//! ```yaml
//! plugin_name: "Site Toolkit"
//! site_root: /var/www/html
//! targets:
//!   htaccess: /var/www/html/.htaccess
//! backups:
//!   dir: ~/.confguard/backups
//! validation:
//!   php_binary: php
//!   sentinel: wp-settings.php
//! liveness:
//!   endpoints:
//!     - https://example.org/
//!     - https://example.org/wp-admin/admin-ajax.php
//!   timeouts_secs: [10, 15]
//!   min_success_ratio: 0.5
//! logs:
//!   rotation_threshold_bytes: 10485760
//!   files:
//!     - /var/www/html/wp-content/query.log
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_PLUGIN_NAME: &str = "Site Toolkit";
pub const DEFAULT_ROTATION_THRESHOLD: u64 = 10 * 1024 * 1024;

/// The complete structure of `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Identity embedded in every managed-block marker.
    pub plugin_name: String,
    /// Directory of the governed site; target paths default relative to it.
    pub site_root: String,
    pub targets: TargetPaths,
    pub backups: BackupSettings,
    pub validation: ValidationSettings,
    pub liveness: LivenessSettings,
    pub logs: LogSettings,
    /// Optional user preset catalog (TOML) that overrides the bundled one.
    pub presets_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            site_root: ".".to_string(),
            targets: TargetPaths::default(),
            backups: BackupSettings::default(),
            validation: ValidationSettings::default(),
            liveness: LivenessSettings::default(),
            logs: LogSettings::default(),
            presets_file: None,
        }
    }
}

/// Explicit target file paths. Unset entries resolve against `site_root`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetPaths {
    pub wp_config: Option<String>,
    pub php_ini: Option<String>,
    pub htaccess: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupSettings {
    /// Where backups are written. Unset means next to each target file.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationSettings {
    /// PHP CLI used for `php -l`; heuristics are used when it cannot be spawned.
    pub php_binary: Option<String>,
    /// Substring the primary config must still contain after a write.
    pub sentinel: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self { php_binary: Some("php".to_string()), sentinel: "wp-settings.php".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LivenessSettings {
    /// URLs of the governed application; empty disables the liveness check.
    pub endpoints: Vec<String>,
    /// One attempt per entry, escalating.
    pub timeouts_secs: Vec<u64>,
    pub retry_delay_ms: u64,
    pub min_success_ratio: f64,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            timeouts_secs: vec![10, 15],
            retry_delay_ms: 500,
            min_success_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    pub rotation_threshold_bytes: u64,
    /// Log files known to the `logs` commands (query log, SMTP log, debug log).
    pub files: Vec<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { rotation_threshold_bytes: DEFAULT_ROTATION_THRESHOLD, files: Vec::new() }
    }
}
