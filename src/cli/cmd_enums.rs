use crate::cli::type_enums::{TargetKind, parse_key_value};
use clap::{Parser, Subcommand};

/// Defines the command-line interface for `confguard`.
#[derive(Parser)]
#[command(name = "confguard")]
#[command(about = "Apply PHP limits to a site's configuration files with backup and rollback")]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config.yaml (defaults to ~/.confguard/config.yaml).
    #[arg(long, global = true, env = "CONFGUARD_CONFIG")]
    pub config: Option<String>,

    /// Path to the settings store (defaults to ~/.confguard/state.json).
    #[arg(long, global = true, env = "CONFGUARD_STATE")]
    pub state: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current version of the tool.
    Version,
    /// Apply a preset or individual settings through the first strategy that succeeds.
    Apply {
        /// Name of a preset from the catalog (low, medium, high, custom, ...).
        #[arg(long, conflicts_with = "set", required_unless_present = "set")]
        preset: Option<String>,
        /// Individual setting, repeatable (e.g. --set memory_limit=256M).
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
        /// Remember the --set values as the `custom` preset.
        #[arg(long, requires = "set")]
        save_custom: bool,
    },
    /// Show the settings currently written in each target file.
    Status,
    /// Remove the managed block from every target file.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// List, restore or delete configuration backups.
    Backups {
        #[command(subcommand)]
        action: BackupCommands,
    },
    /// Append to, inspect or clean up rotating log files.
    Logs {
        #[command(subcommand)]
        action: LogCommands,
    },
    /// List the available presets.
    Presets,
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// List backups, newest first.
    List {
        /// Restrict to one target [possible values: wp-config, php-ini, htaccess].
        #[arg(long)]
        target: Option<TargetKind>,
    },
    /// Restore a target from a backup (the newest unless --checksum is given).
    Restore {
        #[arg(long)]
        target: TargetKind,
        /// Checksum prefix of the backup to restore.
        #[arg(long)]
        checksum: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Delete every backup of a target (or of all targets).
    Cleanup {
        #[arg(long)]
        target: Option<TargetKind>,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// Append a line to a log file, rotating it first if it is full.
    Append {
        /// Log file to write.
        #[arg(long)]
        file: String,
        /// Text to append; a trailing newline is added when missing.
        message: String,
    },
    /// Delete numbered generations (`<log>.1`, `<log>.2`, ...).
    Cleanup {
        /// Log file; defaults to every file listed in config.yaml.
        #[arg(long)]
        file: Option<String>,
    },
    /// Report the size of logs including their generations.
    Size {
        #[arg(long)]
        file: Option<String>,
    },
}
