//! Core reporting types: per-target entries and outcome kinds.

/// Result of processing one target, kept for the run summary and the
/// exit status decision.
#[derive(Debug, Clone)]
pub struct TargetEntry {
    /// Human-readable outcome message, e.g. `New link created 'a' -> 'b'`.
    pub message: String,
    /// Final outcome of the target.
    pub outcome: Outcome,
    /// Whether the target belongs to the elevated group.
    pub sudo: bool,
}

/// Outcome of a processed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The filesystem was changed to match the target.
    Applied,
    /// The destination was already in the desired state.
    AlreadyOk,
    /// Policy forbade the change, or the run was interrupted.
    Skipped,
    /// Dry-run mode; the target would change the filesystem.
    WouldChange,
    /// The target could not be applied.
    Failed,
}
