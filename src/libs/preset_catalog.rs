//! # Preset Catalog
//!
//! Named bundles of settings. The `low`, `medium` and `high` presets ship inside the
//! binary; a user TOML file can override or extend them, and the `custom` preset is the
//! last set of values the user saved into the settings store.

use crate::error::ConfigError;
use crate::libs::state_management::SettingsStore;
use crate::schemas::presets::{Preset, PresetCatalogFile};
use crate::schemas::state_file::KEY_CUSTOM_PRESET;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BUNDLED_PRESETS: &str = include_str!("../../presets/presets.toml");

/// Name under which the store-backed preset is exposed.
pub const CUSTOM_PRESET: &str = "custom";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetCatalog {
    presets: BTreeMap<String, Preset>,
}

impl PresetCatalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_toml("bundled presets.toml", BUNDLED_PRESETS)
    }

    /// Parses a catalog from TOML text. `origin` is only used in error messages.
    pub fn from_toml(origin: &str, text: &str) -> Result<Self, ConfigError> {
        let file: PresetCatalogFile = toml::from_str(text)
            .map_err(|source| ConfigError::Toml { origin: origin.to_string(), source })?;
        Ok(PresetCatalog { presets: file.presets })
    }

    /// Bundled presets overlaid with those from `user_file`, when given.
    ///
    /// # Errors
    /// A user file that exists but cannot be read or parsed.
    pub fn load(user_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut catalog = Self::bundled()?;
        let Some(path) = user_file else {
            return Ok(catalog);
        };
        if !path.exists() {
            log_debug!("[Presets] No user catalog at {}", path.display());
            return Ok(catalog);
        }
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let user = Self::from_toml(&path.display().to_string(), &text)?;
        log_info!(
            "[Presets] Loaded {} preset(s) from {}",
            user.presets.len(),
            path.display().to_string().cyan()
        );
        catalog.presets.extend(user.presets);
        Ok(catalog)
    }

    /// Adds the `custom` preset from the settings store when one has been saved.
    pub fn with_custom(mut self, store: &SettingsStore) -> Self {
        let settings: BTreeMap<String, String> = store.get(KEY_CUSTOM_PRESET, BTreeMap::new());
        if !settings.is_empty() {
            self.presets.insert(
                CUSTOM_PRESET.to_string(),
                Preset { description: "Saved custom values".to_string(), settings },
            );
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Preset)> {
        self.presets.iter()
    }
}
