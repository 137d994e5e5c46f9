//! Target planning.
//!
//! A planner inspects the current filesystem state of one target and
//! decides what, if anything, has to change. Plans are computed fresh
//! on every run and either handed to the writer or, in dry-run mode,
//! reported and discarded. Planning itself never mutates anything.

mod create;
mod diff;
mod filecontent;

pub use create::plan_create;
pub use diff::unified_diff;
pub use filecontent::plan_filecontent;

use std::path::PathBuf;

use crate::error::TargetError;
use crate::fetch::Source;

/// Run-wide flags, resolved once at startup from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Promote `allow` policies to proceed.
    pub force: bool,
    /// Report what would change without mutating anything.
    pub dry_run: bool,
    /// Include unified diffs with replacement reports.
    pub show_diff: bool,
}

/// The decision computed for one target before any mutation.
#[derive(Debug)]
pub struct TargetPlan {
    /// What to do and how to report it.
    pub plan: Plan,
    /// Permission bits applied after a successful write.
    pub mode: Option<ModeChange>,
    /// Unified diff of current vs. desired content, when requested.
    pub diff: Option<String>,
    /// Keeps a fetched source alive until the write completes.
    pub source: Option<Source>,
}

impl TargetPlan {
    /// A plan that only records a failure.
    #[must_use]
    pub const fn fail(error: TargetError) -> Self {
        Self {
            plan: Plan::Fail { error },
            mode: None,
            diff: None,
            source: None,
        }
    }
}

/// What happens to the destination.
#[derive(Debug)]
pub enum Plan {
    /// Destination already in the desired state.
    NoOpAlreadyCorrect {
        /// Report line.
        message: String,
    },
    /// Destination absent; create it.
    CreateNew {
        /// The mutation to perform.
        write: Write,
        /// Report line after the write succeeds.
        message: String,
        /// Report line for dry-run mode.
        would: String,
    },
    /// Replace an existing destination with new content.
    ReplaceExisting {
        /// The mutation to perform.
        write: Write,
        /// Move the old regular file to a timestamped backup first.
        backup: bool,
        /// Report line after the write succeeds.
        message: String,
        /// Report line for dry-run mode.
        would: String,
    },
    /// Re-point an existing symlink.
    RelinkExisting {
        /// The mutation to perform.
        write: Write,
        /// Never set for symlink destinations; kept for the writer's
        /// uniform backup handling.
        backup: bool,
        /// Report line after the write succeeds.
        message: String,
        /// Report line for dry-run mode.
        would: String,
    },
    /// Policy refused the change; the destination is left alone.
    Skip {
        /// Why the target was not applied.
        reason: String,
    },
    /// The target cannot be applied.
    Fail {
        /// What went wrong.
        error: TargetError,
    },
}

/// The concrete mutation a plan performs.
#[derive(Debug)]
pub enum Write {
    /// Create a symlink at `dest` pointing to `src`.
    Symlink {
        /// Link target.
        src: PathBuf,
        /// Link location.
        dest: PathBuf,
        /// Create missing parent directories of `dest` first.
        create_parents: bool,
    },
    /// Copy the bytes of `src` to `dest`.
    Copy {
        /// File to copy from.
        src: PathBuf,
        /// File to create.
        dest: PathBuf,
        /// Create missing parent directories of `dest` first.
        create_parents: bool,
    },
    /// Replace the entire text of `dest`.
    Splice {
        /// File to rewrite.
        dest: PathBuf,
        /// The full new content.
        text: String,
    },
}

impl Write {
    /// The destination path this write touches.
    #[must_use]
    pub fn dest(&self) -> &std::path::Path {
        match self {
            Self::Symlink { dest, .. } | Self::Copy { dest, .. } | Self::Splice { dest, .. } => {
                dest
            }
        }
    }
}

/// Permission bits applied to the destination after a write.
#[derive(Debug, Clone)]
pub struct ModeChange {
    /// Path the bits are applied to.
    pub dest: PathBuf,
    /// Bits parsed from the config `mode` string.
    pub bits: u32,
    /// The destination is a symlink, so the change lands on the file
    /// the link points to.
    pub warns_symlink: bool,
}
