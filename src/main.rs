mod cli;
mod commands;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands};
use commands::{Context, apply, backups, logs, presets, reset, status, version};
use confguard::{log_debug, log_error, logger};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);
    log_debug!("[CLI] Arguments parsed");

    if let Err(e) = run(cli) {
        log_error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        version::run();
        return Ok(());
    }

    let ctx = Context::load(cli.config.as_deref(), cli.state.as_deref())?;
    match cli.command {
        Commands::Version => Ok(()),
        Commands::Apply { preset, set, save_custom } => apply::run(&ctx, preset, set, save_custom),
        Commands::Status => status::run(&ctx),
        Commands::Reset { yes } => reset::run(&ctx, yes),
        Commands::Backups { action } => backups::run(&ctx, action),
        Commands::Logs { action } => logs::run(&ctx, action),
        Commands::Presets => presets::run(&ctx),
    }
}
