// Data shapes shared across the crate: dialects, setting keys, backup records,
// mutation outcomes, rotation bookkeeping and the on-disk file schemas.

pub mod app_config;
pub mod backup_record;
pub mod dialect;
pub mod mutation;
pub mod presets;
pub mod rotation;
pub mod settings;
pub mod state_file;
