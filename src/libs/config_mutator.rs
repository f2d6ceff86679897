//! # Config Mutator
//!
//! The strategy orchestrator. Settings are sanitized up front; then each configured target
//! is tried in priority order (primary config, ini file, directive file), and every attempt
//! runs the same sequence:
//!
//! 1. precondition: the file exists and is writable
//! 2. exclusive advisory lock on `<file-name>.confguard.lock` in the backup directory
//! 3. snapshot through the [`BackupStore`]
//! 4. transform: strip prior blocks, render, insert
//! 5. atomic commit, plus a round-trip read for the primary config
//! 6. syntax validation
//! 7. liveness probes (primary config only)
//!
//! Any failure after the commit restores the snapshot before the next strategy is tried.
//! The first strategy that succeeds ends the run.

use crate::error::{BlockError, MutationError};
use crate::libs::atomic_writer::{AtomicCommitter, AtomicWriter, FileCommitter};
use crate::libs::backup_store::BackupStore;
use crate::libs::block_codec::BlockCodec;
use crate::libs::liveness::{EndpointProber, LivenessProbe};
use crate::libs::setting_mapper::SettingMapper;
use crate::libs::syntax_validator::SyntaxValidator;
use crate::libs::utilities::file_lock::FileLock;
use crate::libs::utilities::file_operations::{check_writable, read_text};
use crate::libs::utilities::path_helpers::{expand_path, file_name_of, resolve_against};
use crate::schemas::app_config::AppConfig;
use crate::schemas::backup_record::BackupRecord;
use crate::schemas::dialect::{Dialect, DialectProfile};
use crate::schemas::mutation::{AttemptOutcome, MutationResult, StrategyAttempt};
use crate::schemas::settings::{ManagedSetting, SettingKey};
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One file the mutator may write, and the dialect it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTarget {
    pub dialect: Dialect,
    pub path: PathBuf,
}

impl StrategyTarget {
    pub fn new(dialect: Dialect, path: impl Into<PathBuf>) -> Self {
        StrategyTarget { dialect, path: path.into() }
    }

    /// The primary application config gets round-trip verification and liveness probes.
    pub fn is_primary(&self) -> bool {
        self.dialect == Dialect::ConstantDefine
    }
}

/// Applies and clears managed blocks across the configured targets.
pub struct ConfigMutator {
    plugin: String,
    targets: Vec<StrategyTarget>,
    backup_dir: Option<PathBuf>,
    validator: SyntaxValidator,
    liveness: LivenessProbe,
    endpoints: Vec<String>,
    committer: Box<dyn FileCommitter>,
}

impl ConfigMutator {
    /// # Arguments
    /// * `plugin`: Identity embedded in the block markers.
    /// * `targets`: Strategies in priority order.
    /// * `backup_dir`: Shared backup directory, or `None` to keep backups beside each file.
    /// * `validator`: Post-write syntax checker.
    /// * `liveness`: Probe used after the primary config is rewritten.
    /// * `endpoints`: URLs probed for liveness; empty skips the check.
    pub fn new(
        plugin: impl Into<String>,
        targets: Vec<StrategyTarget>,
        backup_dir: Option<PathBuf>,
        validator: SyntaxValidator,
        liveness: LivenessProbe,
        endpoints: Vec<String>,
    ) -> Self {
        ConfigMutator {
            plugin: plugin.into(),
            targets,
            backup_dir,
            validator,
            liveness,
            endpoints,
            committer: Box::new(AtomicCommitter),
        }
    }

    /// Replaces the commit step, which defaults to [`AtomicCommitter`].
    pub fn with_committer(mut self, committer: Box<dyn FileCommitter>) -> Self {
        self.committer = committer;
        self
    }

    /// Wires a mutator from `config.yaml`, using `prober` for liveness requests.
    pub fn from_config(config: &AppConfig, prober: Box<dyn EndpointProber>) -> Self {
        Self::new(
            config.plugin_name.clone(),
            Self::targets_from_config(config),
            config.backups.dir.as_deref().map(expand_path),
            SyntaxValidator::from_settings(&config.validation),
            LivenessProbe::from_settings(&config.liveness, prober),
            config.liveness.endpoints.clone(),
        )
    }

    /// The default strategy order with paths resolved against `site_root`.
    pub fn targets_from_config(config: &AppConfig) -> Vec<StrategyTarget> {
        let root = expand_path(&config.site_root);
        let resolve = |explicit: &Option<String>, default: &str| {
            resolve_against(&root, explicit.as_deref().unwrap_or(default))
        };
        vec![
            StrategyTarget::new(Dialect::ConstantDefine, resolve(&config.targets.wp_config, "wp-config.php")),
            StrategyTarget::new(Dialect::IniLines, resolve(&config.targets.php_ini, "php.ini")),
            StrategyTarget::new(Dialect::DirectiveBlock, resolve(&config.targets.htaccess, ".htaccess")),
        ]
    }

    pub fn targets(&self) -> &[StrategyTarget] {
        &self.targets
    }

    pub fn profile(&self, dialect: Dialect) -> DialectProfile {
        dialect.profile(&self.plugin)
    }

    /// The backup store for files of `dialect`, carrying that dialect's retention cap.
    pub fn backup_store(&self, dialect: Dialect) -> BackupStore {
        BackupStore::new(self.backup_dir.clone(), self.profile(dialect).backup_cap)
    }

    /// Sanitizes `raw` and applies it through the first strategy that succeeds.
    ///
    /// # Errors
    /// Only `MutationError::Validation`, raised before any file is read or written.
    /// Exhausting every strategy is reported as `Ok` with `success == false`.
    pub fn apply(&self, raw: &BTreeMap<String, String>) -> Result<MutationResult, MutationError> {
        let settings = SettingMapper::sanitize_all(raw)?;
        Ok(self.apply_settings(&settings))
    }

    /// Applies already-sanitized settings.
    pub fn apply_settings(&self, settings: &BTreeMap<SettingKey, String>) -> MutationResult {
        let managed: Vec<ManagedSetting> = settings
            .iter()
            .map(|(key, value)| ManagedSetting::new(*key, value.as_str()))
            .collect();
        let mut attempts = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            let expressible: BTreeMap<SettingKey, String> = managed
                .iter()
                .filter(|setting| setting.affinity().contains(&target.dialect))
                .map(|setting| (setting.key, setting.value.clone()))
                .collect();

            let outcome = if expressible.is_empty() {
                AttemptOutcome::Skipped(format!("no settings expressible as {}", target.dialect))
            } else {
                log_info!(
                    "[Mutator] Trying {} on {}",
                    target.dialect.to_string().bold(),
                    target.path.display().to_string().cyan()
                );
                self.attempt(target, |profile, content| {
                    BlockCodec::replace_block(profile, content, &expressible)
                })
            };

            let succeeded = outcome.is_success();
            attempts.push(StrategyAttempt {
                strategy: target.dialect,
                path: target.path.clone(),
                outcome,
            });
            if succeeded {
                break;
            }
        }

        let result = MutationResult::from_attempts(attempts);
        if result.success {
            log_info!("[Mutator] {}", result.message.green());
        } else {
            log_error!("[Mutator] All strategies failed: {}", result.message);
        }
        result
    }

    /// Removes the managed block from every target, with the same snapshot and rollback
    /// discipline as [`ConfigMutator::apply`].
    pub fn clear(&self) -> MutationResult {
        let attempts: Vec<StrategyAttempt> = self
            .targets
            .iter()
            .map(|target| {
                log_info!(
                    "[Mutator] Clearing {} block from {}",
                    target.dialect,
                    target.path.display().to_string().cyan()
                );
                let outcome = self.attempt(target, BlockCodec::strip_blocks);
                StrategyAttempt { strategy: target.dialect, path: target.path.clone(), outcome }
            })
            .collect();

        let result = MutationResult::from_clear_attempts(attempts);
        if result.success {
            log_info!("[Mutator] {}", result.message.green());
        } else {
            log_warn!("[Mutator] Reset incomplete: {}", result.message);
        }
        result
    }

    /// Settings currently written in each readable target's managed block.
    pub fn current_settings(&self) -> Vec<(Dialect, PathBuf, BTreeMap<SettingKey, String>)> {
        self.targets
            .iter()
            .filter_map(|target| {
                let content = match read_text(&target.path) {
                    Ok(content) => content,
                    Err(e) => {
                        log_debug!("[Mutator] Skipping {}: {}", target.path.display(), e);
                        return None;
                    },
                };
                let profile = self.profile(target.dialect);
                Some((target.dialect, target.path.clone(), BlockCodec::parse_block(&profile, &content)))
            })
            .collect()
    }

    /// Runs one snapshot → transform → commit → validate cycle on `target`.
    fn attempt<F>(&self, target: &StrategyTarget, transform: F) -> AttemptOutcome
    where
        F: Fn(&DialectProfile, &str) -> Result<String, BlockError>,
    {
        let path = target.path.as_path();
        if let Err(reason) = check_writable(path) {
            log_warn!("[Mutator] Skipping {}: {}", path.display(), reason);
            return AttemptOutcome::Skipped(reason);
        }

        let profile = self.profile(target.dialect);
        let store = self.backup_store(target.dialect);

        let lock_path = store.dir_for(path).join(format!("{}.confguard.lock", file_name_of(path)));
        let _lock = match FileLock::acquire(&lock_path) {
            Ok(lock) => lock,
            Err(e) => return failed(MutationError::io(lock_path, e)),
        };

        let original = match read_text(path) {
            Ok(content) => content,
            Err(e) => return failed(MutationError::io(path, e)),
        };

        let updated = match transform(&profile, &original) {
            Ok(updated) => updated,
            Err(source) => return failed(MutationError::Marker { path: path.to_path_buf(), source }),
        };

        if updated == original {
            log_info!("[Mutator] {} already up to date", path.display().to_string().cyan());
            return AttemptOutcome::Unchanged;
        }

        let snapshot = match store.create(path) {
            Ok(record) => record,
            Err(e) => return failed(e),
        };

        if let Err(e) = self.committer.commit(path, &updated) {
            return failed(MutationError::io(path, e));
        }

        if let Err(reason) = self.verify(target, &profile, &updated) {
            return self.roll_back(&store, &snapshot, reason);
        }

        log_info!(
            "[Mutator] {} written to {}",
            profile.dialect.to_string().bold(),
            path.display().to_string().green()
        );
        AttemptOutcome::Applied
    }

    /// Post-commit checks. The returned message names the first check that failed.
    fn verify(&self, target: &StrategyTarget, profile: &DialectProfile, expected: &str) -> Result<(), String> {
        if target.is_primary() && !AtomicWriter::verify_roundtrip(&target.path, expected) {
            return Err("round-trip verification failed".to_string());
        }

        self.validator
            .check_syntax(&target.path, profile)
            .map_err(|e| e.to_string())?;

        if target.is_primary() && self.endpoints.is_empty() {
            log_warn!(
                "[Mutator] No liveness endpoints configured; {} was written without a reachability check",
                target.path.display()
            );
        } else if target.is_primary() {
            let report = self.liveness.probe_liveness(&self.endpoints);
            if !report.passes() {
                return Err(MutationError::Liveness {
                    successful: report.successful,
                    total: report.total,
                }
                .to_string());
            }
        }
        Ok(())
    }

    fn roll_back(&self, store: &BackupStore, snapshot: &BackupRecord, reason: String) -> AttemptOutcome {
        log_warn!(
            "[Mutator] {}; restoring {}",
            reason,
            snapshot.source_path.display().to_string().yellow()
        );
        match store.restore(snapshot) {
            Ok(()) => AttemptOutcome::RolledBack(reason),
            Err(e) => {
                log_error!(
                    "[Mutator] Restore of {} failed: {}. Latest backup: {}",
                    snapshot.source_path.display(),
                    e,
                    snapshot.backup_path.display()
                );
                AttemptOutcome::Failed(format!("{reason}; restore failed: {e}"))
            },
        }
    }
}

fn failed(error: MutationError) -> AttemptOutcome {
    log_warn!("[Mutator] {}", error);
    AttemptOutcome::Failed(error.to_string())
}

/// Whether `path` currently holds a managed block for `profile`.
pub fn has_managed_block(path: &Path, profile: &DialectProfile) -> bool {
    read_text(path)
        .map(|content| BlockCodec::count_blocks(profile, &content) > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::fs;
    use std::time::Duration;

    struct AlwaysUp;

    impl EndpointProber for AlwaysUp {
        fn probe(&self, _url: &str, _timeout: Duration) -> Result<u16, ProbeError> {
            Ok(200)
        }
    }

    fn mutator(dir: &Path) -> ConfigMutator {
        ConfigMutator::new(
            "Site Toolkit",
            vec![
                StrategyTarget::new(Dialect::ConstantDefine, dir.join("wp-config.php")),
                StrategyTarget::new(Dialect::IniLines, dir.join("php.ini")),
            ],
            None,
            SyntaxValidator::new(None, "wp-settings.php"),
            LivenessProbe::new(Box::new(AlwaysUp), vec![Duration::from_secs(1)], Duration::ZERO, 0.5),
            Vec::new(),
        )
    }

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn targets_resolve_against_site_root() {
        let config: AppConfig =
            serde_yaml::from_str("site_root: /srv/site\ntargets:\n  htaccess: /etc/apache/site.htaccess\n").unwrap();
        let targets = ConfigMutator::targets_from_config(&config);
        assert_eq!(targets[0], StrategyTarget::new(Dialect::ConstantDefine, "/srv/site/wp-config.php"));
        assert_eq!(targets[1], StrategyTarget::new(Dialect::IniLines, "/srv/site/php.ini"));
        assert_eq!(targets[2], StrategyTarget::new(Dialect::DirectiveBlock, "/etc/apache/site.htaccess"));
    }

    #[test]
    fn missing_primary_falls_through_to_ini() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("php.ini"), "[PHP]\nengine = On\n").unwrap();

        let result = mutator(dir.path()).apply(&raw(&[("memory_limit", "256M")])).unwrap();

        assert!(result.success);
        assert_eq!(result.strategy, Some(Dialect::IniLines));
        assert!(matches!(result.attempts[0].outcome, AttemptOutcome::Skipped(_)));
        let ini = fs::read_to_string(dir.path().join("php.ini")).unwrap();
        assert!(ini.contains("memory_limit = 256M\n"));
        assert!(!ini.contains("admin_memory_limit"));
    }

    #[test]
    fn invalid_value_fails_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("php.ini");
        fs::write(&ini, "engine = On\n").unwrap();

        let err = mutator(dir.path()).apply(&raw(&[("memory_limit", "lots")])).unwrap_err();

        assert!(matches!(err, MutationError::Validation { .. }));
        assert_eq!(fs::read_to_string(&ini).unwrap(), "engine = On\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn current_settings_reads_blocks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("php.ini"), "engine = On\n").unwrap();
        let mutator = mutator(dir.path());
        mutator.apply(&raw(&[("max_input_vars", "3000")])).unwrap();

        let current = mutator.current_settings();

        assert_eq!(current.len(), 1);
        assert_eq!(current[0].0, Dialect::IniLines);
        assert_eq!(current[0].2.get(&SettingKey::MaxInputVars).map(String::as_str), Some("3000"));
        assert!(has_managed_block(&dir.path().join("php.ini"), &mutator.profile(Dialect::IniLines)));
    }
}
