// Small, dependency-light helpers used across the `libs` services:
// checksums, file probing, advisory locks, path expansion and timestamps.

pub mod checksum;
pub mod file_lock;
pub mod file_operations;
pub mod path_helpers;
pub mod timestamps;
