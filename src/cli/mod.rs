// Command-line surface: the clap-derived parser and the value types it accepts.

pub mod cmd_enums;
pub mod type_enums;
