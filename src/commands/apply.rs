// The `confguard apply` command: resolves a preset (or `--set` pairs) into raw settings,
// hands them to the mutator and records the outcome in the settings store.

use super::{Context, print_attempts};
use anyhow::{Context as _, Result};
use colored::Colorize;
use confguard::libs::preset_catalog::{CUSTOM_PRESET, PresetCatalog};
use confguard::libs::state_management::SettingsStore;
use confguard::libs::utilities::path_helpers::expand_path;
use confguard::libs::utilities::timestamps::current_timestamp;
use confguard::schemas::state_file::{
    KEY_CUSTOM_PRESET, KEY_LAST_APPLIED_AT, KEY_LAST_PRESET, KEY_LAST_STRATEGY, KEY_LAST_TARGET,
};
use confguard::{log_debug, log_info};
use std::collections::BTreeMap;

/// Main entry point for the `apply` command.
///
/// # Arguments
/// * `ctx`: Loaded configuration and resolved paths.
/// * `preset`: Preset name; mutually exclusive with `set`.
/// * `set`: Individual `key=value` pairs.
/// * `save_custom`: Store the `set` pairs as the `custom` preset after a successful apply.
pub fn run(ctx: &Context, preset: Option<String>, set: Vec<(String, String)>, save_custom: bool) -> Result<()> {
    let mut store = SettingsStore::open(&ctx.paths.state)?;

    let (label, raw): (String, BTreeMap<String, String>) = match preset {
        Some(name) => {
            let presets_file = ctx.config.presets_file.as_deref().map(expand_path);
            let catalog = PresetCatalog::load(presets_file.as_deref())?.with_custom(&store);
            let preset = catalog.get(&name).with_context(|| {
                format!("unknown preset '{}'; available: {}", name, catalog.names().join(", "))
            })?;
            (name, preset.settings.clone())
        },
        None => (CUSTOM_PRESET.to_string(), set.into_iter().collect()),
    };
    log_info!("[Apply] Applying {} ({} setting(s))", label.bold(), raw.len());
    log_debug!("[Apply] Raw settings: {:?}", raw);

    let mutator = ctx.mutator();
    let result = mutator.apply(&raw)?;
    print_attempts(&result);

    if let (Some(strategy), Some(target)) = (result.strategy, result.target.as_ref()) {
        store.set(KEY_LAST_PRESET, &label)?;
        store.set(KEY_LAST_STRATEGY, strategy.as_str())?;
        store.set(KEY_LAST_TARGET, target.display().to_string())?;
        store.set(KEY_LAST_APPLIED_AT, current_timestamp())?;
        if save_custom {
            store.set(KEY_CUSTOM_PRESET, &raw)?;
        }
    }

    let result = result.into_result()?;
    log_info!("[Apply] {}", result.message.green());
    Ok(())
}
