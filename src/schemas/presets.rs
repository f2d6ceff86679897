use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named bundle of raw setting values, e.g. `medium`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    #[serde(default)]
    pub description: String,
    /// Raw `setting → value` pairs; sanitized by the mapper at apply time.
    pub settings: BTreeMap<String, String>,
}

/// Configuration schema for `presets.toml`.
///
/// ```toml
/// [presets.medium]
/// description = "Typical shared hosting"
/// settings = { memory_limit = "256M", max_execution_time = "120" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PresetCatalogFile {
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}
