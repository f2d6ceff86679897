//! # Managed Setting Keys
//!
//! The fixed set of PHP runtime settings the mutator knows about. Keys are ordered by their
//! declaration order, which is also the order lines appear in a rendered managed block.

use crate::schemas::dialect::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known setting identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    MemoryLimit,
    /// Derived ceiling for the governed app's administrative context.
    AdminMemoryLimit,
    MaxExecutionTime,
    MaxInputTime,
    MaxInputVars,
    UploadMaxFilesize,
    PostMaxSize,
}

/// The grammar family a key's value must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `^\d+[MG]?$`
    Size,
    /// Integer within an inclusive range.
    Bounded { min: u64, max: u64 },
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::MemoryLimit,
        SettingKey::AdminMemoryLimit,
        SettingKey::MaxExecutionTime,
        SettingKey::MaxInputTime,
        SettingKey::MaxInputVars,
        SettingKey::UploadMaxFilesize,
        SettingKey::PostMaxSize,
    ];

    /// The key as written by callers and as the PHP ini directive name.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::MemoryLimit => "memory_limit",
            SettingKey::AdminMemoryLimit => "admin_memory_limit",
            SettingKey::MaxExecutionTime => "max_execution_time",
            SettingKey::MaxInputTime => "max_input_time",
            SettingKey::MaxInputVars => "max_input_vars",
            SettingKey::UploadMaxFilesize => "upload_max_filesize",
            SettingKey::PostMaxSize => "post_max_size",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            SettingKey::MemoryLimit
            | SettingKey::AdminMemoryLimit
            | SettingKey::UploadMaxFilesize
            | SettingKey::PostMaxSize => ValueKind::Size,
            SettingKey::MaxExecutionTime | SettingKey::MaxInputTime => {
                ValueKind::Bounded { min: 0, max: 3600 }
            },
            SettingKey::MaxInputVars => ValueKind::Bounded { min: 1000, max: 100_000 },
        }
    }

    /// Dialects this key can be expressed in, in preference order.
    pub fn affinity(self) -> &'static [Dialect] {
        match self {
            SettingKey::AdminMemoryLimit => &[Dialect::ConstantDefine],
            _ => &[Dialect::ConstantDefine, Dialect::IniLines, Dialect::DirectiveBlock],
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SettingKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| format!("unknown setting '{}'", s))
    }
}

/// One sanitized setting bound for a managed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedSetting {
    pub key: SettingKey,
    pub value: String,
}

impl ManagedSetting {
    pub fn new(key: SettingKey, value: impl Into<String>) -> Self {
        Self { key, value: value.into() }
    }

    pub fn affinity(&self) -> &'static [Dialect] {
        self.key.affinity()
    }
}
