//! # Syntax Validator
//!
//! Post-write structural checks for the three dialects. A file that fails here is rolled
//! back by the orchestrator before anything else looks at it.

use crate::error::MutationError;
use crate::libs::utilities::file_operations::read_text;
use crate::schemas::app_config::ValidationSettings;
use crate::schemas::dialect::{Dialect, DialectProfile};
use crate::{log_debug, log_warn};
use colored::Colorize;
use std::io;
use std::path::Path;
use std::process::Command;

/// Substrings that never belong in a web-server directive file.
const FORBIDDEN_DIRECTIVE_PATTERNS: [&str; 8] = [
    "<?php", "<?=", "shell_exec", "passthru(", "system(", "exec(", "popen(", "proc_open(",
];

/// Checks rewritten configuration files.
#[derive(Debug, Clone)]
pub struct SyntaxValidator {
    /// External PHP interpreter used for `php -l`; `None` forces the built-in scanner.
    php_binary: Option<String>,
    /// Substring the primary config must still contain after a rewrite.
    sentinel: String,
}

impl SyntaxValidator {
    pub fn new(php_binary: Option<String>, sentinel: impl Into<String>) -> Self {
        SyntaxValidator { php_binary, sentinel: sentinel.into() }
    }

    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self::new(settings.php_binary.clone(), settings.sentinel.clone())
    }

    /// Boolean form of [`SyntaxValidator::check_syntax`]; the failure reason is logged.
    pub fn validate_syntax(&self, path: &Path, profile: &DialectProfile) -> bool {
        match self.check_syntax(path, profile) {
            Ok(()) => true,
            Err(e) => {
                log_warn!("[Validator] {}", e);
                false
            },
        }
    }

    /// Validates the file at `path` against the rules of `profile.dialect`.
    ///
    /// # Errors
    /// * `MutationError::Io` if the file cannot be read.
    /// * `MutationError::Syntax` with a human-readable reason otherwise.
    pub fn check_syntax(&self, path: &Path, profile: &DialectProfile) -> Result<(), MutationError> {
        let content = read_text(path).map_err(|e| MutationError::io(path, e))?;
        let syntax_error = |reason: String| MutationError::Syntax { path: path.to_path_buf(), reason };

        check_markers(&content, profile).map_err(syntax_error)?;

        match profile.dialect {
            Dialect::ConstantDefine => {
                if !content.contains(self.sentinel.as_str()) {
                    return Err(syntax_error(format!(
                        "required statement '{}' is missing",
                        self.sentinel
                    )));
                }
                check_block_placement(&content, profile, &self.sentinel).map_err(syntax_error)?;
                match self.run_php_lint(path) {
                    Some(result) => result.map_err(syntax_error)?,
                    None => scan_php(&content).map_err(syntax_error)?,
                }
            },
            Dialect::DirectiveBlock => check_directives(&content).map_err(syntax_error)?,
            Dialect::IniLines => check_ini(&content).map_err(syntax_error)?,
        }

        log_debug!(
            "[Validator] {} passed {} checks",
            path.display().to_string().cyan(),
            profile.dialect
        );
        Ok(())
    }

    /// Runs `php -l`. `None` when no interpreter is configured or it cannot be spawned.
    fn run_php_lint(&self, path: &Path) -> Option<Result<(), String>> {
        let binary = self.php_binary.as_deref()?;
        let output = match Command::new(binary).arg("-l").arg(path).output() {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log_debug!("[Validator] '{}' not found; using built-in PHP scanner", binary);
                return None;
            },
            Err(e) => {
                log_debug!("[Validator] Could not run '{}': {}; using built-in scanner", binary, e);
                return None;
            },
        };

        if output.status.success() {
            return Some(Ok(()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = [stdout.trim(), stderr.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Err(format!("php -l rejected the file: {detail}")))
    }
}

/// Exactly one begin and one end marker in that order, or neither.
fn check_markers(content: &str, profile: &DialectProfile) -> Result<(), String> {
    let begins = content.matches(profile.begin.as_str()).count();
    let ends = content.matches(profile.end.as_str()).count();
    match (begins, ends) {
        (0, 0) => Ok(()),
        (1, 1) => {
            let begin_at = content.find(profile.begin.as_str()).unwrap_or(0);
            let end_at = content.find(profile.end.as_str()).unwrap_or(0);
            if begin_at < end_at {
                Ok(())
            } else {
                Err("end marker precedes begin marker".to_string())
            }
        },
        _ => Err(format!("expected one marker pair, found {begins} begin and {ends} end markers")),
    }
}

/// The managed block must sit in PHP mode and before the bootstrap statement, or its
/// constants are defined after the application has already read them.
fn check_block_placement(content: &str, profile: &DialectProfile, sentinel: &str) -> Result<(), String> {
    let Some(begin_at) = content.find(profile.begin.as_str()) else {
        return Ok(());
    };
    if let Some(sentinel_at) = content.rfind(sentinel) {
        if begin_at > sentinel_at {
            return Err(format!("managed block comes after '{sentinel}' and would never take effect"));
        }
    }
    let before = &content[..begin_at];
    let closed = before.rfind("?>");
    if closed.is_some() && closed > before.rfind("<?") {
        return Err("managed block sits after a closing '?>' tag".to_string());
    }
    Ok(())
}

/// Bracket, string and comment balance for PHP source.
fn scan_php(content: &str) -> Result<(), String> {
    let chars: Vec<char> = content.chars().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\n' => line += 1,
            '\'' | '"' => {
                let start_line = line;
                i += 1;
                loop {
                    let Some(&ch) = chars.get(i) else {
                        return Err(format!("unterminated string starting on line {start_line}"));
                    };
                    if ch == '\\' {
                        if chars.get(i + 1) == Some(&'\n') {
                            line += 1;
                        }
                        i += 2;
                        continue;
                    }
                    if ch == '\n' {
                        line += 1;
                    }
                    if ch == c {
                        break;
                    }
                    i += 1;
                }
            },
            '/' if next == Some('/') => {
                while i + 1 < chars.len() && chars[i + 1] != '\n' {
                    i += 1;
                }
            },
            '#' if next != Some('[') => {
                while i + 1 < chars.len() && chars[i + 1] != '\n' {
                    i += 1;
                }
            },
            '/' if next == Some('*') => {
                let start_line = line;
                i += 2;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(format!("unterminated comment starting on line {start_line}"));
                        },
                        Some('*') if chars.get(i + 1) == Some(&'/') => {
                            i += 1;
                            break;
                        },
                        Some('\n') => line += 1,
                        Some(_) => {},
                    }
                    i += 1;
                }
            },
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {},
                    Some((open, open_line)) => {
                        return Err(format!(
                            "'{c}' on line {line} does not close '{open}' from line {open_line}"
                        ));
                    },
                    None => return Err(format!("unexpected '{c}' on line {line}")),
                }
            },
            _ => {},
        }
        i += 1;
    }

    match stack.pop() {
        Some((open, open_line)) => Err(format!("'{open}' opened on line {open_line} is never closed")),
        None => Ok(()),
    }
}

/// Balanced `<Section>` / `</Section>` pairs and no executable content.
fn check_directives(content: &str) -> Result<(), String> {
    let lowered = content.to_lowercase();
    if let Some(pattern) = FORBIDDEN_DIRECTIVE_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Err(format!("forbidden content '{pattern}'"));
    }

    let mut open: Vec<(String, usize)> = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("</") {
            let name = section_name(rest);
            match open.pop() {
                Some((expected, _)) if expected.eq_ignore_ascii_case(&name) => {},
                Some((expected, opened)) => {
                    return Err(format!(
                        "</{name}> on line {line_no} does not close <{expected}> from line {opened}"
                    ));
                },
                None => return Err(format!("</{name}> on line {line_no} has no opening section")),
            }
        } else if let Some(rest) = line.strip_prefix('<') {
            if !line.ends_with('>') {
                return Err(format!("unterminated section header on line {line_no}"));
            }
            open.push((section_name(rest), line_no));
        }
    }

    match open.pop() {
        Some((name, line_no)) => Err(format!("<{name}> opened on line {line_no} is never closed")),
        None => Ok(()),
    }
}

fn section_name(rest: &str) -> String {
    rest.split(|c: char| c.is_whitespace() || c == '>')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Every meaningful line is a `[section]` header or a `key = value` pair.
fn check_ini(content: &str) -> Result<(), String> {
    if content.contains("<?") {
        return Err("PHP open tag in ini file".to_string());
    }
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            if line.ends_with(']') && line.len() > 2 {
                continue;
            }
            return Err(format!("malformed section header on line {}", index + 1));
        }
        match line.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() => {},
            _ => return Err(format!("line {} is not a 'key = value' pair", index + 1)),
        }
    }
    Ok(())
}
