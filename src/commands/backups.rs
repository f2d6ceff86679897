// The `confguard backups` subcommands: inspect, restore and delete snapshots.

use super::{Context, target_for};
use crate::cli::cmd_enums::BackupCommands;
use crate::cli::type_enums::TargetKind;
use anyhow::{Context as _, Result};
use colored::Colorize;
use confguard::libs::config_mutator::{ConfigMutator, StrategyTarget};
use confguard::libs::utilities::timestamps::describe_age;
use confguard::{log_debug, log_info, log_warn};
use dialoguer::Confirm;
use prettytable::{Table, row};

pub fn run(ctx: &Context, action: BackupCommands) -> Result<()> {
    let mutator = ctx.mutator();
    match action {
        BackupCommands::List { target } => list(&mutator, target),
        BackupCommands::Restore { target, checksum, yes } => restore(&mutator, target, checksum, yes),
        BackupCommands::Cleanup { target, yes } => cleanup(&mutator, target, yes),
    }
}

/// The chosen target, or all of them.
fn selected(mutator: &ConfigMutator, target: Option<TargetKind>) -> Result<Vec<StrategyTarget>> {
    match target {
        Some(kind) => Ok(vec![target_for(mutator, kind.dialect())?]),
        None => Ok(mutator.targets().to_vec()),
    }
}

fn list(mutator: &ConfigMutator, target: Option<TargetKind>) -> Result<()> {
    let mut table = Table::new();
    table.set_titles(row!["File", "Created", "Size", "Checksum", "Backup"]);
    let mut total = 0usize;
    for target in selected(mutator, target)? {
        let store = mutator.backup_store(target.dialect);
        log_debug!("[Backups] {} keeps up to {} backup(s)", target.path.display(), store.cap());
        for record in store.list(&target.path)? {
            total += 1;
            table.add_row(row![
                target.path.display(),
                describe_age(&record.created_at),
                format!("{} B", record.size),
                record.short_checksum(),
                record.backup_path.display()
            ]);
        }
    }
    if total == 0 {
        log_info!("[Backups] No backups found");
        return Ok(());
    }
    table.printstd();
    Ok(())
}

fn restore(mutator: &ConfigMutator, kind: TargetKind, checksum: Option<String>, yes: bool) -> Result<()> {
    let target = target_for(mutator, kind.dialect())?;
    let store = mutator.backup_store(target.dialect);
    let record = match checksum.as_deref() {
        Some(prefix) => store
            .list(&target.path)?
            .into_iter()
            .find(|record| record.checksum.starts_with(&prefix.to_lowercase()))
            .with_context(|| format!("no backup of {} matches checksum '{prefix}'", target.path.display()))?,
        None => store
            .latest(&target.path)?
            .with_context(|| format!("no backups exist for {}", target.path.display()))?,
    };

    let prompt = format!(
        "Restore {} from the backup taken {}?",
        target.path.display(),
        describe_age(&record.created_at)
    );
    if !yes && !Confirm::new().with_prompt(prompt).default(false).interact()? {
        log_info!("[Backups] Cancelled");
        return Ok(());
    }

    store.restore(&record)?;
    log_info!(
        "[Backups] Restored {} from {}",
        target.path.display().to_string().green(),
        record.short_checksum().cyan()
    );
    Ok(())
}

fn cleanup(mutator: &ConfigMutator, target: Option<TargetKind>, yes: bool) -> Result<()> {
    let targets = selected(mutator, target)?;
    if !yes
        && !Confirm::new()
            .with_prompt(format!("Delete all backups of {} file(s)?", targets.len()))
            .default(false)
            .interact()?
    {
        log_info!("[Backups] Cancelled");
        return Ok(());
    }

    let mut removed = 0usize;
    for target in targets {
        match mutator.backup_store(target.dialect).cleanup(&target.path) {
            Ok(count) => removed += count,
            Err(e) => log_warn!("[Backups] {}", e),
        }
    }
    log_info!("[Backups] Removed {} backup(s)", removed.to_string().bold());
    Ok(())
}
