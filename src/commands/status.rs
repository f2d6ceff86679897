use super::Context;
use anyhow::Result;
use colored::Colorize;
use confguard::libs::state_management::SettingsStore;
use confguard::libs::utilities::timestamps::time_since;
use confguard::log_info;
use confguard::schemas::state_file::{KEY_LAST_APPLIED_AT, KEY_LAST_PRESET, KEY_LAST_STRATEGY};
use prettytable::{Table, row};

/// Shows the managed settings found in each target, plus what the store remembers.
pub fn run(ctx: &Context) -> Result<()> {
    let mutator = ctx.mutator();
    let current = mutator.current_settings();

    let mut table = Table::new();
    table.set_titles(row!["Strategy", "File", "Setting", "Value"]);
    for target in mutator.targets() {
        let found = current.iter().find(|(dialect, _, _)| *dialect == target.dialect);
        match found {
            None => {
                table.add_row(row![target.dialect, target.path.display(), "-", "file missing"]);
            },
            Some((_, _, settings)) if settings.is_empty() => {
                table.add_row(row![target.dialect, target.path.display(), "-", "no managed block"]);
            },
            Some((_, _, settings)) => {
                for (key, value) in settings {
                    table.add_row(row![target.dialect, target.path.display(), key, value]);
                }
            },
        }
    }
    table.printstd();

    let store = SettingsStore::open(&ctx.paths.state)?;
    let preset: String = store.get(KEY_LAST_PRESET, String::new());
    if preset.is_empty() {
        log_info!("[Status] No preset has been applied yet");
        return Ok(());
    }
    let strategy: String = store.get(KEY_LAST_STRATEGY, "unknown".to_string());
    let applied_at: String = store.get(KEY_LAST_APPLIED_AT, String::new());
    let age = time_since(&applied_at).unwrap_or_else(|| "at an unknown time".to_string());
    log_info!(
        "[Status] Last applied preset {} via {} {}",
        preset.bold(),
        strategy.cyan(),
        age
    );
    Ok(())
}
