// The `confguard logs` subcommands over the rotating log writer.

use super::Context;
use crate::cli::cmd_enums::LogCommands;
use anyhow::{Result, bail};
use colored::Colorize;
use confguard::libs::log_writer::RotatingLogWriter;
use confguard::libs::utilities::path_helpers::expand_path;
use confguard::{log_info, log_warn};
use prettytable::{Table, row};
use std::path::PathBuf;

pub fn run(ctx: &Context, action: LogCommands) -> Result<()> {
    let writer = RotatingLogWriter::new(ctx.config.logs.rotation_threshold_bytes);
    match action {
        LogCommands::Append { file, message } => {
            let path = expand_path(&file);
            let line = if message.ends_with('\n') { message } else { format!("{message}\n") };
            let outcome = writer.append(&path, &line)?;
            if outcome.rotated {
                log_info!("[Logs] {} was full and has been rotated", path.display().to_string().cyan());
            }
            Ok(())
        },
        LogCommands::Cleanup { file } => {
            let mut removed = 0usize;
            for path in log_files(ctx, file)? {
                removed += writer.cleanup_old_generations(&path)?;
            }
            log_info!("[Logs] Removed {} generation file(s)", removed.to_string().bold());
            Ok(())
        },
        LogCommands::Size { file } => {
            let mut table = Table::new();
            table.set_titles(row!["Log", "Active", "Total", "Generations", "Threshold"]);
            for path in log_files(ctx, file)? {
                let state = writer.state(&path);
                let due = if state.due() { " (rotation due)" } else { "" };
                table.add_row(row![
                    path.display(),
                    format!("{} B{}", state.current_size, due),
                    format!("{} B", writer.total_size(&path)),
                    state.retained_generations,
                    format!("{} B", state.threshold)
                ]);
            }
            table.printstd();
            Ok(())
        },
    }
}

/// `--file` when given, otherwise every log listed in `config.yaml`.
fn log_files(ctx: &Context, file: Option<String>) -> Result<Vec<PathBuf>> {
    if let Some(file) = file {
        return Ok(vec![expand_path(&file)]);
    }
    if ctx.config.logs.files.is_empty() {
        log_warn!("[Logs] No log files are listed under `logs.files` in {}", ctx.paths.config.display());
        bail!("pass --file or configure logs.files");
    }
    Ok(ctx.config.logs.files.iter().map(|file| expand_path(file)).collect())
}
