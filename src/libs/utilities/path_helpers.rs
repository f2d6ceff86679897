// Our custom logging macros.
use crate::log_debug;
// The 'colored' crate helps us make our console output look pretty and readable.
use colored::Colorize;
// For working with file paths.
use std::path::{Path, PathBuf};

/// Resolves paths that start with a tilde `~` into the user's home directory.
///
/// # Arguments
/// * `path`: A string slice (`&str`) representing the path, which might start with `~`.
///
/// # Returns
/// * `PathBuf`: The fully resolved path if `~` was present and the home directory
///   could be determined. Otherwise, it returns the original path unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with('~') {
        // `dirs::home_dir()` is a cross-platform way to get the home directory.
        if let Some(home) = dirs::home_dir() {
            // Replace only the *first* `~`, so `~/a/~/b` keeps its inner tilde.
            return PathBuf::from(path.replacen('~', &home.to_string_lossy(), 1));
        }
    }
    PathBuf::from(path)
}

/// Expands `~` and environment variables (`$HOME`, `${SITE_ROOT}`, …) in a path string.
///
/// Falls back to tilde-only expansion when a referenced variable is undefined, so a typo
/// in the config surfaces as a "file not found" on the literal path rather than a panic.
pub fn expand_path(path: &str) -> PathBuf {
    let tilde_expanded = expand_tilde(path);
    if !path.contains('$') {
        return tilde_expanded;
    }

    let path_string = tilde_expanded.to_string_lossy().to_string();
    match shellexpand::full(&path_string) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log_debug!(
                "[Paths] Could not expand variables in {}: {}",
                path.yellow(),
                e
            );
            tilde_expanded
        },
    }
}

/// Resolves `path` against `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() { expanded } else { base.join(expanded) }
}

/// Returns the canonical path to the confguard directory, `~/.confguard`.
/// Falls back to a relative `.confguard` when no home directory can be determined.
pub fn get_confguard_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home_dir) => home_dir.join(".confguard"),
        None => PathBuf::from(".confguard"),
    }
}

/// Appends `suffix` to the final component of `path` (`wp-config.php` → `wp-config.php.1`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// The final component of `path` as a lossy string, or `file` when there is none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended_to_file_name() {
        let path = Path::new("/var/log/query.log");
        assert_eq!(with_suffix(path, ".1"), PathBuf::from("/var/log/query.log.1"));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/site");
        assert_eq!(resolve_against(base, "wp-config.php"), PathBuf::from("/srv/site/wp-config.php"));
        assert_eq!(resolve_against(base, "/etc/php.ini"), PathBuf::from("/etc/php.ini"));
    }

    #[test]
    fn file_name_falls_back_for_root() {
        assert_eq!(file_name_of(Path::new("/srv/.htaccess")), ".htaccess");
        assert_eq!(file_name_of(Path::new("/")), "file");
    }
}
