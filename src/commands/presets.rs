use super::Context;
use anyhow::Result;
use confguard::libs::preset_catalog::PresetCatalog;
use confguard::libs::state_management::SettingsStore;
use confguard::libs::utilities::path_helpers::expand_path;
use prettytable::{Table, row};

/// Lists every preset with its settings.
pub fn run(ctx: &Context) -> Result<()> {
    let store = SettingsStore::open(&ctx.paths.state)?;
    let presets_file = ctx.config.presets_file.as_deref().map(expand_path);
    let catalog = PresetCatalog::load(presets_file.as_deref())?.with_custom(&store);

    let mut table = Table::new();
    table.set_titles(row!["Preset", "Description", "Settings"]);
    for (name, preset) in catalog.iter() {
        let settings = preset
            .settings
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(row![name, preset.description, settings]);
    }
    table.printstd();
    Ok(())
}
