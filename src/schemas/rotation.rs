use serde::Serialize;
use std::path::PathBuf;

/// Snapshot of a rotating log file's bookkeeping, used for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationState {
    pub active_path: PathBuf,
    /// Size of the active file in bytes (0 when it does not exist yet).
    pub current_size: u64,
    pub threshold: u64,
    /// Number of `<path>.<N>` generations currently on disk.
    pub retained_generations: usize,
}

impl RotationState {
    /// Whether the next non-empty append will rotate first.
    pub fn due(&self) -> bool {
        self.current_size > 0 && self.current_size >= self.threshold
    }
}

/// What a single append did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendOutcome {
    pub rotated: bool,
    pub bytes_written: usize,
}
