use confguard::schemas::dialect::Dialect;
use std::fmt;
use std::str::FromStr;

/// The configuration files a command can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    WpConfig, // wp-config.php - PHP constants
    PhpIni,   // php.ini / .user.ini - ini directives
    Htaccess, // .htaccess - Apache directives
}

impl TargetKind {
    pub fn dialect(self) -> Dialect {
        match self {
            TargetKind::WpConfig => Dialect::ConstantDefine,
            TargetKind::PhpIni => Dialect::IniLines,
            TargetKind::Htaccess => Dialect::DirectiveBlock,
        }
    }
}

impl FromStr for TargetKind {
    type Err = String;

    /// Parses a target name, case-insensitively.
    ///
    /// # Returns
    /// * `Ok(TargetKind)` for `wp-config`, `php-ini` or `htaccess` (dialect names also work).
    /// * `Err(String)` listing the valid names otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wp-config" | "wp_config" | "constant_define" => Ok(TargetKind::WpConfig),
            "php-ini" | "php_ini" | "ini" | "ini_lines" => Ok(TargetKind::PhpIni),
            "htaccess" | ".htaccess" | "directive_block" => Ok(TargetKind::Htaccess),
            _ => Err(format!(
                "Invalid target '{s}'. Must be one of: wp-config, php-ini, htaccess"
            )),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TargetKind::WpConfig => write!(f, "wp-config"),
            TargetKind::PhpIni => write!(f, "php-ini"),
            TargetKind::Htaccess => write!(f, "htaccess"),
        }
    }
}

/// Parses a `key=value` pair given to `--set`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Expected KEY=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse_case_insensitively() {
        assert_eq!("WP-Config".parse::<TargetKind>(), Ok(TargetKind::WpConfig));
        assert_eq!(".htaccess".parse::<TargetKind>(), Ok(TargetKind::Htaccess));
        assert_eq!("ini".parse::<TargetKind>().map(TargetKind::dialect), Ok(Dialect::IniLines));
        assert!("nginx".parse::<TargetKind>().is_err());
    }

    #[test]
    fn key_value_pairs_are_split_once() {
        assert_eq!(
            parse_key_value("memory_limit = 256M"),
            Ok(("memory_limit".to_string(), "256M".to_string()))
        );
        assert!(parse_key_value("memory_limit").is_err());
        assert!(parse_key_value("=1").is_err());
    }
}
