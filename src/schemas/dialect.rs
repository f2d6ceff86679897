//! # Configuration Dialects
//!
//! The three file syntaxes the mutator knows how to edit. A [`Dialect`] is selected once per
//! strategy and its [`DialectProfile`] (marker pair, insertion anchors, backup cap) is built
//! once from the configured plugin identity and passed through the codec, mapper and
//! validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The file syntaxes a managed block can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// PHP `define()` / `ini_set()` statements in the primary application config.
    ConstantDefine,
    /// Apache `php_value` / `php_flag` lines inside `<IfModule>` guards.
    DirectiveBlock,
    /// `key = value` pairs in a PHP ini file.
    IniLines,
}

/// Apache modules whose presence guards the directive lines.
pub const PHP_MODULE_GUARDS: [&str; 2] = ["mod_php7.c", "mod_php.c"];

impl Dialect {
    /// Builds the per-variant record for this dialect.
    ///
    /// # Arguments
    /// * `plugin`: The plugin identity embedded in the markers, e.g. `Site Toolkit`.
    pub fn profile(self, plugin: &str) -> DialectProfile {
        let (begin, end, anchors, backup_cap): (String, String, Vec<&'static str>, usize) =
            match self {
                Dialect::ConstantDefine => (
                    format!("/* BEGIN {plugin} PHP Configuration */"),
                    format!("/* END {plugin} PHP Configuration */"),
                    vec![
                        "/* That's all, stop editing!",
                        // Any spelling of the bootstrap include, e.g. `require_once(ABSPATH . ...)`.
                        "wp-settings.php",
                    ],
                    10,
                ),
                Dialect::DirectiveBlock => (
                    format!("# BEGIN {plugin} PHP Config"),
                    format!("# END {plugin} PHP Config"),
                    vec!["# BEGIN WordPress"],
                    3,
                ),
                Dialect::IniLines => (
                    format!("; BEGIN {plugin} PHP Config"),
                    format!("; END {plugin} PHP Config"),
                    vec![],
                    3,
                ),
            };

        DialectProfile { dialect: self, begin, end, anchors, backup_cap }
    }

    /// Short lowercase name used in logs and in the settings store.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::ConstantDefine => "constant_define",
            Dialect::DirectiveBlock => "directive_block",
            Dialect::IniLines => "ini_lines",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the codec and validator need to know about one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectProfile {
    pub dialect: Dialect,
    /// Exact begin marker line (without the newline).
    pub begin: String,
    /// Exact end marker line (without the newline).
    pub end: String,
    /// Insertion anchors, tried in order; the block goes before the first one present.
    pub anchors: Vec<&'static str>,
    /// How many backups of a file in this dialect are retained.
    pub backup_cap: usize,
}

impl DialectProfile {
    /// The first anchor that occurs in `content`, if any.
    pub fn anchor_in<'a>(&'a self, content: &str) -> Option<&'a str> {
        self.anchors.iter().copied().find(|anchor| content.contains(anchor))
    }
}
