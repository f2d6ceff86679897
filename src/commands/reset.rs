use super::{Context, print_attempts};
use anyhow::{Result, bail};
use confguard::libs::config_mutator::has_managed_block;
use confguard::libs::state_management::SettingsStore;
use confguard::log_info;
use confguard::schemas::state_file::{KEY_LAST_APPLIED_AT, KEY_LAST_PRESET, KEY_LAST_STRATEGY, KEY_LAST_TARGET};
use dialoguer::Confirm;

/// Removes every managed block, restoring the targets to the host's own defaults.
///
/// # Arguments
/// * `ctx`: Loaded configuration and resolved paths.
/// * `yes`: Skip the confirmation prompt.
pub fn run(ctx: &Context, yes: bool) -> Result<()> {
    let mutator = ctx.mutator();
    let holding = mutator
        .targets()
        .iter()
        .filter(|target| has_managed_block(&target.path, &mutator.profile(target.dialect)))
        .count();
    if holding == 0 {
        log_info!("[Reset] No managed blocks found; nothing to remove");
        return Ok(());
    }

    if !yes
        && !Confirm::new()
            .with_prompt(format!("Remove confguard settings from {holding} file(s)?"))
            .default(false)
            .interact()?
    {
        log_info!("[Reset] Cancelled");
        return Ok(());
    }

    let result = mutator.clear();
    print_attempts(&result);
    if !result.success {
        bail!("reset incomplete: {}", result.message);
    }

    let mut store = SettingsStore::open(&ctx.paths.state)?;
    for key in [KEY_LAST_PRESET, KEY_LAST_STRATEGY, KEY_LAST_TARGET, KEY_LAST_APPLIED_AT] {
        store.remove(key)?;
    }
    log_info!("[Reset] {}", result.message);
    Ok(())
}
