//! # Error Taxonomy
//!
//! Every failure the configuration core can report. The orchestrator only lets
//! [`MutationError::Validation`] escape `apply` as an `Err`; everything else is recorded
//! against the strategy attempt that produced it and the next strategy is tried.

use crate::schemas::dialect::Dialect;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the configuration core.
#[derive(Debug, Error)]
pub enum MutationError {
    /// A setting value failed its grammar or range check. Raised before any file is touched.
    #[error("invalid value '{value}' for '{key}': {reason}")]
    Validation {
        key: String,
        value: String,
        reason: String,
    },

    /// A file could not be read, written or renamed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The rewritten file failed structural or syntax validation.
    #[error("syntax check failed for {}: {reason}", path.display())]
    Syntax { path: PathBuf, reason: String },

    /// Post-write reachability probes fell below the success threshold.
    #[error("liveness check failed: {successful}/{total} endpoints responded")]
    Liveness { successful: usize, total: usize },

    /// The block codec refused to edit the file.
    #[error("managed block in {} is unsafe to edit: {source}", path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: BlockError,
    },

    /// Every strategy was tried and none succeeded.
    #[error("all configuration strategies failed: {summary}")]
    ExhaustedStrategies { summary: String },
}

impl MutationError {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MutationError::Io { path: path.into(), source }
    }

    /// Builds a validation error for `key`.
    pub fn validation(key: &str, value: &str, reason: impl Into<String>) -> Self {
        MutationError::Validation {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Refusals from the block codec. None of these ever result in a write.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    /// The begin marker exists but no end marker follows it (or an end marker stands alone).
    #[error("{dialect} block has a begin marker without a matching end marker")]
    Unterminated { dialect: Dialect },

    /// Removing the matched span would delete more than half of the file.
    #[error("removing the {dialect} block would drop {removed} of {original} bytes")]
    Oversized {
        dialect: Dialect,
        removed: usize,
        original: usize,
    },
}

/// Failures from an endpoint probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Failures loading confguard's own YAML/TOML/JSON files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid preset catalog {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid state file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
