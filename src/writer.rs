//! Filesystem mutation for computed plans.

use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::TargetError;
use crate::plan::{ModeChange, Plan, TargetPlan, Write};

/// Carry out the mutation a plan calls for, then apply any mode
/// change.
///
/// `NoOpAlreadyCorrect` performs no write but still enforces `mode`.
/// `Skip` and `Fail` plans are never handed to the writer.
pub fn apply(target: &TargetPlan) -> Result<(), TargetError> {
    match &target.plan {
        Plan::CreateNew { write, .. } => perform(write)?,
        Plan::ReplaceExisting { write, backup, .. } => replace(write, *backup)?,
        Plan::RelinkExisting { write, .. } => {
            remove_link(write.dest())?;
            perform(write)?;
        }
        Plan::NoOpAlreadyCorrect { .. } | Plan::Skip { .. } | Plan::Fail { .. } => {}
    }
    if let Some(mode) = &target.mode {
        set_mode(mode)?;
    }
    Ok(())
}

/// Clear the destination, honoring the backup request, then write.
///
/// A splice without backup rewrites the file in place, keeping its
/// inode and permissions. Everything else removes the old entry first.
fn replace(write: &Write, backup: bool) -> Result<(), TargetError> {
    if backup {
        backup_rename(write.dest())?;
    } else if !matches!(write, Write::Splice { .. }) {
        remove_destination(write.dest())?;
    }
    perform(write)
}

fn perform(write: &Write) -> Result<(), TargetError> {
    match write {
        Write::Symlink {
            src,
            dest,
            create_parents,
        } => {
            if *create_parents {
                create_parent_dirs(dest)?;
            }
            std::os::unix::fs::symlink(src, dest).map_err(|source| TargetError::Io {
                message: format!("Failed to create link {src:?} -> {dest:?}"),
                source,
            })
        }
        Write::Copy {
            src,
            dest,
            create_parents,
        } => {
            if *create_parents {
                create_parent_dirs(dest)?;
            }
            fs::copy(src, dest)
                .map(drop)
                .map_err(|source| TargetError::Io {
                    message: format!("Failed to copy file: {src:?} -> {dest:?}"),
                    source,
                })
        }
        Write::Splice { dest, text } => {
            tracing::debug!("Applying file content changes to: {}", dest.display());
            fs::write(dest, text).map_err(|source| TargetError::Io {
                message: format!("Failed to write file {dest:?}"),
                source,
            })
        }
    }
}

/// Move the destination aside as `<path>.<timestamp>`.
fn backup_rename(path: &Path) -> Result<(), TargetError> {
    let suffix = chrono::Local::now().format("%Y%m%d%H%M%S");
    let backup = PathBuf::from(format!("{}.{suffix}", path.display()));
    tracing::debug!("Backing up {path:?} as {backup:?}...");
    fs::rename(path, &backup).map_err(|source| TargetError::BackupFailed {
        path: path.display().to_string(),
        backup: backup.display().to_string(),
        source,
    })
}

fn remove_destination(dest: &Path) -> Result<(), TargetError> {
    if dest.is_symlink() {
        return remove_link(dest);
    }
    fs::remove_file(dest).map_err(|source| TargetError::Io {
        message: format!("Failed to remove file {dest:?}"),
        source,
    })
}

fn remove_link(dest: &Path) -> Result<(), TargetError> {
    fs::remove_file(dest).map_err(|source| TargetError::Io {
        message: format!("Failed to remove link: {dest:?}"),
        source,
    })
}

fn create_parent_dirs(dest: &Path) -> Result<(), TargetError> {
    let Some(dir) = dest.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).map_err(|source| TargetError::Io {
        message: format!("Failed to create directories {dir:?}"),
        source,
    })
}

fn set_mode(mode: &ModeChange) -> Result<(), TargetError> {
    tracing::debug!("Setting mode {:03o} on {:?}", mode.bits, mode.dest);
    fs::set_permissions(&mode.dest, Permissions::from_mode(mode.bits)).map_err(|source| {
        TargetError::Io {
            message: format!("Failed to set mode on {:?}", mode.dest),
            source,
        }
    })
}
