//! # Settings Store Schema (`state.json`)
//!
//! The persistent key-value store shared with the external admin layer. It remembers which
//! preset and strategy were last applied and the values of the user's custom preset.
//!
//! ## Example State File
//! ```json
//! {
//!   "values": {
//!     "last_preset": "medium",
//!     "last_strategy": "constant_define",
//!     "last_target": "/var/www/html/wp-config.php",
//!     "last_applied_at": "2024-01-15T10:30:45+00:00",
//!     "custom_preset": { "memory_limit": "768M" }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const KEY_LAST_PRESET: &str = "last_preset";
pub const KEY_LAST_STRATEGY: &str = "last_strategy";
pub const KEY_LAST_TARGET: &str = "last_target";
pub const KEY_LAST_APPLIED_AT: &str = "last_applied_at";
pub const KEY_CUSTOM_PRESET: &str = "custom_preset";

/// The complete structure of `state.json`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Arbitrary JSON values keyed by name. A `BTreeMap` keeps the file diff-friendly.
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}
