//! # Setting Mapper
//!
//! Turns sanitized `(key, value)` pairs into statements for a target dialect and back.
//!
//! A small fixed table drives the dialect-native forms:
//!
//! | Key                  | ConstantDefine                       | IniLines               | DirectiveBlock                  |
//! |----------------------|--------------------------------------|------------------------|---------------------------------|
//! | `memory_limit`       | `define('WP_MEMORY_LIMIT', …)`       | `memory_limit = …`     | `php_value memory_limit …`      |
//! | `admin_memory_limit` | `define('WP_MAX_MEMORY_LIMIT', …)`   | unsupported            | unsupported                     |
//! | everything else      | fallback `ini_set('key', '…');`      | `key = …`              | `php_value key …`               |
//!
//! Values are validated here before any file is touched.

use crate::error::MutationError;
use crate::schemas::dialect::Dialect;
use crate::schemas::settings::{SettingKey, ValueKind};
use crate::log_debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SIZE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[MG]?$").expect("size regex is valid"));

static CONSTANT_STATEMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(define|ini_set)\(\s*'([A-Za-z_]+)'\s*,\s*'([^']*)'\s*\);$")
        .expect("statement regex is valid")
});
/// The administrative ceiling never drops below this many MiB.
const ADMIN_CEILING_FLOOR_MIB: u64 = 256;

/// How a setting is expressed in a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// A statement the dialect understands natively.
    Native(String),
    /// A generic statement used when no native form exists (`ini_set(...)`).
    Fallback(String),
    /// The dialect has no way to express the setting; it is left out of the block.
    Unsupported,
}

impl Representation {
    pub fn line(&self) -> Option<&str> {
        match self {
            Representation::Native(line) | Representation::Fallback(line) => Some(line),
            Representation::Unsupported => None,
        }
    }
}

/// Stateless namespace for mapping and sanitizing settings.
pub struct SettingMapper;

impl SettingMapper {
    /// The WordPress constant that natively carries `key`, if one exists.
    pub fn native_constant(key: SettingKey) -> Option<&'static str> {
        match key {
            SettingKey::MemoryLimit => Some("WP_MEMORY_LIMIT"),
            SettingKey::AdminMemoryLimit => Some("WP_MAX_MEMORY_LIMIT"),
            _ => None,
        }
    }

    /// Returns the representation of `key = value` in `dialect`.
    pub fn map(key: SettingKey, value: &str, dialect: Dialect) -> Representation {
        match dialect {
            Dialect::ConstantDefine => match Self::native_constant(key) {
                Some(constant) => Representation::Native(format!("define('{constant}', '{value}');")),
                None => Representation::Fallback(format!("ini_set('{}', '{}');", key.as_str(), value)),
            },
            Dialect::IniLines => match key {
                SettingKey::AdminMemoryLimit => Representation::Unsupported,
                _ => Representation::Native(format!("{} = {}", key.as_str(), value)),
            },
            Dialect::DirectiveBlock => match key {
                SettingKey::AdminMemoryLimit => Representation::Unsupported,
                _ if is_flag(value) => {
                    Representation::Native(format!("php_flag {} {}", key.as_str(), value))
                },
                _ => Representation::Native(format!("php_value {} {}", key.as_str(), value)),
            },
        }
    }

    /// Reads one managed-block line back into a `(key, value)` pair.
    ///
    /// Lines that are not setting statements (markers, `<IfModule>` guards, comments)
    /// yield `None`.
    pub fn parse_statement(line: &str, dialect: Dialect) -> Option<(SettingKey, String)> {
        let line = line.trim();
        match dialect {
            Dialect::ConstantDefine => {
                let captures = CONSTANT_STATEMENT_REGEX.captures(line)?;
                let name = captures.get(2)?.as_str();
                let value = captures.get(3)?.as_str().to_string();
                let key = if &captures[1] == "define" {
                    SettingKey::ALL
                        .iter()
                        .copied()
                        .find(|key| Self::native_constant(*key) == Some(name))?
                } else {
                    name.parse().ok()?
                };
                Some((key, value))
            },
            Dialect::IniLines => {
                if line.starts_with(';') || line.starts_with('#') {
                    return None;
                }
                let (name, value) = line.split_once('=')?;
                let key = name.trim().parse().ok()?;
                Some((key, value.trim().trim_matches('"').to_string()))
            },
            Dialect::DirectiveBlock => {
                let mut parts = line.split_whitespace();
                match parts.next()? {
                    "php_value" | "php_flag" => {},
                    _ => return None,
                }
                let key = parts.next()?.parse().ok()?;
                let value = parts.collect::<Vec<_>>().join(" ");
                if value.is_empty() {
                    return None;
                }
                Some((key, value.trim_matches('"').to_string()))
            },
        }
    }

    /// Validates and normalizes a raw value for `key`.
    ///
    /// Sizes must match `^\d+[MG]?$` (a lowercase unit is accepted and upper-cased);
    /// bounded integers must fall inside the key's inclusive range.
    pub fn sanitize_value(key: SettingKey, raw: &str) -> Result<String, MutationError> {
        let trimmed = raw.trim();
        match key.value_kind() {
            ValueKind::Size => {
                let normalized = trimmed.to_uppercase();
                if !SIZE_REGEX.is_match(&normalized) {
                    return Err(MutationError::validation(
                        key.as_str(),
                        raw,
                        "expected a size like 256M, 1G or a byte count",
                    ));
                }
                Ok(normalized)
            },
            ValueKind::Bounded { min, max } => {
                let number: u64 = trimmed.parse().map_err(|_| {
                    MutationError::validation(key.as_str(), raw, "expected a whole number")
                })?;
                if number < min || number > max {
                    return Err(MutationError::validation(
                        key.as_str(),
                        raw,
                        format!("must be between {min} and {max}"),
                    ));
                }
                Ok(number.to_string())
            },
        }
    }

    /// Parses and sanitizes a caller-supplied map, then adds derived settings.
    ///
    /// Setting `memory_limit` also sets `admin_memory_limit` to
    /// `max(1.5 × memory_limit, 256M)` unless the caller supplied one explicitly.
    ///
    /// # Errors
    /// `MutationError::Validation` for an empty map, an unknown key or a bad value.
    pub fn sanitize_all(
        raw: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<SettingKey, String>, MutationError> {
        if raw.is_empty() {
            return Err(MutationError::validation("settings", "", "no settings supplied"));
        }

        let mut sanitized = BTreeMap::new();
        for (name, value) in raw {
            let key: SettingKey = name
                .parse()
                .map_err(|reason: String| MutationError::validation(name, value, reason))?;
            sanitized.insert(key, Self::sanitize_value(key, value)?);
        }

        if let Some(memory) = sanitized.get(&SettingKey::MemoryLimit) {
            if !sanitized.contains_key(&SettingKey::AdminMemoryLimit) {
                let ceiling = Self::derive_admin_ceiling(memory);
                log_debug!("[Mapper] Derived admin_memory_limit {} from memory_limit {}", ceiling, memory);
                sanitized.insert(SettingKey::AdminMemoryLimit, ceiling);
            }
        }
        Ok(sanitized)
    }

    /// `max(1.5 × memory_limit, 256M)`, expressed in `M`.
    pub fn derive_admin_ceiling(memory_limit: &str) -> String {
        let requested = size_in_mib(memory_limit);
        let ceiling = (requested.saturating_mul(3) / 2).max(ADMIN_CEILING_FLOOR_MIB);
        format!("{ceiling}M")
    }
}

/// Converts a sanitized size (`256M`, `1G`, `268435456`) to whole MiB.
fn size_in_mib(value: &str) -> u64 {
    let value = value.trim();
    if let Some(number) = value.strip_suffix('G') {
        number.parse::<u64>().unwrap_or(0).saturating_mul(1024)
    } else if let Some(number) = value.strip_suffix('M') {
        number.parse::<u64>().unwrap_or(0)
    } else {
        value.parse::<u64>().unwrap_or(0) / (1024 * 1024)
    }
}

fn is_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "on" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn memory_limit_maps_to_wordpress_constant() {
        assert_eq!(
            SettingMapper::map(SettingKey::MemoryLimit, "256M", Dialect::ConstantDefine),
            Representation::Native("define('WP_MEMORY_LIMIT', '256M');".to_string())
        );
    }

    #[test]
    fn unmapped_keys_fall_back_to_ini_set() {
        assert_eq!(
            SettingMapper::map(SettingKey::MaxInputVars, "3000", Dialect::ConstantDefine),
            Representation::Fallback("ini_set('max_input_vars', '3000');".to_string())
        );
    }

    #[test]
    fn directive_and_ini_forms() {
        assert_eq!(
            SettingMapper::map(SettingKey::PostMaxSize, "32M", Dialect::DirectiveBlock).line(),
            Some("php_value post_max_size 32M")
        );
        assert_eq!(
            SettingMapper::map(SettingKey::PostMaxSize, "32M", Dialect::IniLines).line(),
            Some("post_max_size = 32M")
        );
        assert_eq!(
            SettingMapper::map(SettingKey::AdminMemoryLimit, "384M", Dialect::IniLines),
            Representation::Unsupported
        );
    }

    #[test]
    fn statements_parse_back() {
        for dialect in [Dialect::ConstantDefine, Dialect::IniLines, Dialect::DirectiveBlock] {
            for key in [SettingKey::MemoryLimit, SettingKey::MaxExecutionTime] {
                let rep = SettingMapper::map(key, "120", dialect);
                let line = rep.line().unwrap();
                assert_eq!(
                    SettingMapper::parse_statement(line, dialect),
                    Some((key, "120".to_string())),
                    "{dialect}: {line}"
                );
            }
        }
        assert_eq!(SettingMapper::parse_statement("<IfModule mod_php.c>", Dialect::DirectiveBlock), None);
    }

    #[test]
    fn size_grammar() {
        assert_eq!(SettingMapper::sanitize_value(SettingKey::MemoryLimit, "256m").unwrap(), "256M");
        assert_eq!(SettingMapper::sanitize_value(SettingKey::PostMaxSize, "1G").unwrap(), "1G");
        assert_eq!(SettingMapper::sanitize_value(SettingKey::PostMaxSize, "1048576").unwrap(), "1048576");
        for bad in ["notanumber", "256MB", "-1", "", "12K", "1.5G"] {
            assert!(
                matches!(
                    SettingMapper::sanitize_value(SettingKey::MemoryLimit, bad),
                    Err(MutationError::Validation { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn bounded_ranges() {
        assert_eq!(SettingMapper::sanitize_value(SettingKey::MaxExecutionTime, "0").unwrap(), "0");
        assert_eq!(SettingMapper::sanitize_value(SettingKey::MaxInputTime, "3600").unwrap(), "3600");
        assert!(SettingMapper::sanitize_value(SettingKey::MaxExecutionTime, "3601").is_err());
        assert!(SettingMapper::sanitize_value(SettingKey::MaxInputVars, "999").is_err());
        assert!(SettingMapper::sanitize_value(SettingKey::MaxInputVars, "100001").is_err());
        assert_eq!(SettingMapper::sanitize_value(SettingKey::MaxInputVars, " 3000 ").unwrap(), "3000");
    }

    #[test]
    fn admin_ceiling_is_one_and_a_half_times_with_floor() {
        assert_eq!(SettingMapper::derive_admin_ceiling("256M"), "384M");
        assert_eq!(SettingMapper::derive_admin_ceiling("128M"), "256M");
        assert_eq!(SettingMapper::derive_admin_ceiling("1G"), "1536M");
        assert_eq!(SettingMapper::derive_admin_ceiling("536870912"), "768M");
    }

    #[test]
    fn sanitize_all_derives_ceiling_and_rejects_unknown_keys() {
        let settings = SettingMapper::sanitize_all(&raw(&[("memory_limit", "256M")])).unwrap();
        assert_eq!(settings.get(&SettingKey::AdminMemoryLimit).map(String::as_str), Some("384M"));

        let explicit = SettingMapper::sanitize_all(&raw(&[
            ("memory_limit", "256M"),
            ("admin_memory_limit", "1G"),
        ]))
        .unwrap();
        assert_eq!(explicit.get(&SettingKey::AdminMemoryLimit).map(String::as_str), Some("1G"));

        assert!(SettingMapper::sanitize_all(&raw(&[("display_errors", "1")])).is_err());
        assert!(SettingMapper::sanitize_all(&BTreeMap::new()).is_err());
    }
}
