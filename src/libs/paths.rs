use crate::libs::utilities::path_helpers::{expand_path, get_confguard_dir};
use crate::{log_debug, log_error};
use colored::Colorize;
use std::path::PathBuf;

/// Resolved locations of confguard's own files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// `config.yaml` describing targets and policy.
    pub config: PathBuf,
    /// `state.json` backing the settings store.
    pub state: PathBuf,
}

/// Determines the configuration and state file paths.
///
/// Explicit paths win; otherwise both live under `~/.confguard/`. `~` and `$VAR` are
/// expanded in explicit paths.
///
/// # Arguments
/// * `config_path`: Optional `--config` override.
/// * `state_path`: Optional `--state` override.
///
/// # Returns
/// `None` if a resolved path comes out empty.
pub fn resolve_paths(config_path: Option<&str>, state_path: Option<&str>) -> Option<ResolvedPaths> {
    let base = get_confguard_dir();
    let config = config_path.map(expand_path).unwrap_or_else(|| base.join("config.yaml"));
    let state = state_path.map(expand_path).unwrap_or_else(|| base.join("state.json"));

    if config.as_os_str().is_empty() || state.as_os_str().is_empty() {
        log_error!("[Paths] Resolved config or state path is empty");
        return None;
    }

    log_debug!("[Paths] Configuration file: {}", config.display().to_string().cyan());
    log_debug!("[Paths] State file: {}", state.display().to_string().yellow());
    Some(ResolvedPaths { config, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_win() {
        let paths = resolve_paths(Some("/tmp/c.yaml"), Some("/tmp/s.json")).unwrap();
        assert_eq!(paths.config, PathBuf::from("/tmp/c.yaml"));
        assert_eq!(paths.state, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn defaults_live_in_confguard_dir() {
        let paths = resolve_paths(None, None).unwrap();
        assert!(paths.config.ends_with(".confguard/config.yaml"));
        assert!(paths.state.ends_with(".confguard/state.json"));
    }
}
