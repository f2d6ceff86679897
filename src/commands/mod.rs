// Register application subcommands.
// Each module corresponds to a specific `confguard` command-line action and is a thin
// caller of the library: it loads configuration, drives the core and prints results.

use anyhow::{Context as _, Result};
use confguard::libs::config_loading::load_app_config;
use confguard::libs::config_mutator::{ConfigMutator, StrategyTarget};
use confguard::libs::liveness::UreqProber;
use confguard::libs::paths::{ResolvedPaths, resolve_paths};
use confguard::schemas::app_config::AppConfig;
use confguard::schemas::dialect::Dialect;
use confguard::schemas::mutation::{AttemptOutcome, MutationResult};
use prettytable::{Table, row};

// Applies a preset or ad-hoc settings.
pub mod apply;
// Lists, restores and deletes backups.
pub mod backups;
// Appends to and maintains rotating logs.
pub mod logs;
// Lists the preset catalog.
pub mod presets;
// Removes every managed block.
pub mod reset;
// Shows what each target currently holds.
pub mod status;
// Displays the version of confguard.
pub mod version;

/// Everything a command needs from disk before it starts.
pub struct Context {
    pub paths: ResolvedPaths,
    pub config: AppConfig,
}

impl Context {
    /// Resolves `--config` / `--state` and loads `config.yaml`.
    pub fn load(config: Option<&str>, state: Option<&str>) -> Result<Self> {
        let paths = resolve_paths(config, state).context("could not resolve confguard paths")?;
        let config = load_app_config(&paths.config)?;
        Ok(Context { paths, config })
    }

    /// A mutator wired to the real HTTP prober.
    pub fn mutator(&self) -> ConfigMutator {
        ConfigMutator::from_config(&self.config, Box::new(UreqProber))
    }
}

/// The configured target for `dialect`.
pub fn target_for(mutator: &ConfigMutator, dialect: Dialect) -> Result<StrategyTarget> {
    mutator
        .targets()
        .iter()
        .find(|target| target.dialect == dialect)
        .cloned()
        .with_context(|| format!("no {dialect} target is configured"))
}

/// Prints one row per strategy attempt.
pub fn print_attempts(result: &MutationResult) {
    let mut table = Table::new();
    table.set_titles(row!["Strategy", "File", "Outcome"]);
    for attempt in &result.attempts {
        let outcome = match &attempt.outcome {
            AttemptOutcome::Applied => "applied".to_string(),
            AttemptOutcome::Unchanged => "unchanged".to_string(),
            AttemptOutcome::Skipped(reason) => format!("skipped: {reason}"),
            AttemptOutcome::Failed(reason) => format!("failed: {reason}"),
            AttemptOutcome::RolledBack(reason) => format!("rolled back: {reason}"),
        };
        table.add_row(row![attempt.strategy, attempt.path.display(), outcome]);
    }
    table.printstd();
}
