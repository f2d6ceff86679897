// Services that make up the configuration core and its supporting stores.

// Write-temp-then-rename primitives.
pub mod atomic_writer;
// Timestamped, checksummed snapshots with FIFO eviction.
pub mod backup_store;
// Locating, removing and inserting managed blocks.
pub mod block_codec;
// Loading `config.yaml`.
pub mod config_loading;
// The strategy orchestrator.
pub mod config_mutator;
// HTTP reachability probes after a primary-config write.
pub mod liveness;
// Size-rotating append-only logs.
pub mod log_writer;
// Where confguard keeps its own files.
pub mod paths;
// Named setting bundles.
pub mod preset_catalog;
// Setting keys to dialect statements, and value sanitization.
pub mod setting_mapper;
// `state.json` key-value store.
pub mod state_management;
// Post-write structural checks.
pub mod syntax_validator;
pub mod utilities;
