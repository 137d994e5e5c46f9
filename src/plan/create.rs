//! Planner for `create` targets: symlinks and copies.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::{self, CreateKind, CreateTarget, Policy};
use crate::error::TargetError;
use crate::fetch::{self, Source};
use crate::paths;

use super::{ModeChange, Options, Plan, TargetPlan, Write, diff};

/// Decide what to do for one `create` target.
///
/// Source fetch, destination resolution, and state inspection errors
/// all collapse into a `Fail` plan so that sibling targets keep going.
#[must_use]
pub fn plan_create(target: &CreateTarget, config_dir: &Path, options: Options) -> TargetPlan {
    build(target, config_dir, options).unwrap_or_else(TargetPlan::fail)
}

fn build(
    target: &CreateTarget,
    config_dir: &Path,
    options: Options,
) -> Result<TargetPlan, TargetError> {
    let source = fetch::resolve(&target.src, target.src_type, config_dir)?;
    let expanded = paths::expand_unchecked(&target.dest);
    let dest = paths::resolve_dest(&target.dest, &expanded, target.dest_type)?;
    let method = effective_method(target.kind, target.sudo, source.is_download());
    tracing::debug!(
        "Creating {} of {} at {}",
        method.name(),
        source.label(),
        target.dest
    );

    let plan = match method {
        Method::Link => plan_link(target, &source, &dest, options)?,
        Method::Copy => plan_copy(target, &source, &dest, options)?,
    };
    let diff = match &plan {
        Plan::CreateNew { .. } | Plan::ReplaceExisting { .. } | Plan::RelinkExisting { .. } => {
            diff::file_diff(source.path(), &source.label(), &dest, options.show_diff)
        }
        Plan::NoOpAlreadyCorrect { .. } | Plan::Skip { .. } | Plan::Fail { .. } => None,
    };
    let mode = match &plan {
        Plan::Skip { .. } | Plan::Fail { .. } => None,
        _ => mode_change(target, method, &dest),
    };
    Ok(TargetPlan {
        plan,
        mode,
        diff,
        source: Some(source),
    })
}

/// `type` after `Auto` resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Link,
    Copy,
}

impl Method {
    const fn name(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Copy => "copy",
        }
    }
}

/// `Auto` links by default. Elevated targets copy, so that root never
/// owns a symlink into a user-writable directory, and downloads copy
/// because their temporary file disappears after the run.
const fn effective_method(kind: CreateKind, sudo: bool, download: bool) -> Method {
    match kind {
        CreateKind::Link => Method::Link,
        CreateKind::Copy => Method::Copy,
        CreateKind::Auto => {
            if sudo || download {
                Method::Copy
            } else {
                Method::Link
            }
        }
    }
}

const fn proceeds(policy: Policy, force: bool) -> bool {
    match policy {
        Policy::Always => true,
        Policy::Allow => force,
        Policy::Never => false,
    }
}

fn mode_change(target: &CreateTarget, method: Method, dest: &Path) -> Option<ModeChange> {
    target
        .mode
        .as_deref()
        .and_then(config::mode_bits)
        .map(|bits| ModeChange {
            dest: dest.to_path_buf(),
            bits,
            warns_symlink: method == Method::Link,
        })
}

fn plan_link(
    target: &CreateTarget,
    source: &Source,
    dest: &Path,
    options: Options,
) -> Result<Plan, TargetError> {
    let src = source.path();
    let label = source.label();
    if dest.exists() {
        if dest.is_symlink() {
            let current = read_link(dest)?;
            if current == src {
                tracing::debug!("Correct link already exists.");
                return Ok(Plan::NoOpAlreadyCorrect {
                    message: format!("Correct link already exists {label:?} -> {dest:?}"),
                });
            }
            if !proceeds(target.relink, options.force) {
                return Ok(skip_wrong_source(&current, dest, src));
            }
            tracing::debug!("Relinking to correct source...");
            return Ok(Plan::RelinkExisting {
                write: symlink_write(src, dest, false),
                backup: false,
                message: format!("Incorrect link was relinked {label:?} -> {dest:?}"),
                would: format!("Would relink {label:?} -> {dest:?}"),
            });
        }
        if dest.is_file() {
            if !proceeds(target.replace, options.force) {
                return Ok(skip_file_exists(dest));
            }
            return Ok(Plan::ReplaceExisting {
                write: symlink_write(src, dest, false),
                backup: target.backup,
                message: format!("Replaced file with link {label:?} -> {dest:?}"),
                would: format!("Would replace file with link {label:?} -> {dest:?}"),
            });
        }
        return Err(TargetError::UnreplaceableDestination(
            dest.display().to_string(),
        ));
    }
    if dest.is_symlink() {
        // Target of the link is gone; `exists` followed it and said no.
        let current = read_link(dest)?;
        tracing::debug!("Found broken link {current:?} -> {dest:?}");
        if !proceeds(target.relink, options.force) {
            return Ok(skip_wrong_source(&current, dest, src));
        }
        tracing::debug!("Relinking to correct source...");
        return Ok(Plan::RelinkExisting {
            write: symlink_write(src, dest, false),
            backup: false,
            message: format!("Broken link was relinked {label:?} -> {dest:?}"),
            would: format!("Would relink broken link {label:?} -> {dest:?}"),
        });
    }
    check_parent(dest, target.create_dirs)?;
    tracing::debug!("Creating new link/copy...");
    Ok(Plan::CreateNew {
        write: symlink_write(src, dest, target.create_dirs),
        message: format!("New link created {label:?} -> {dest:?}"),
        would: format!("Would create link {label:?} -> {dest:?}"),
    })
}

fn plan_copy(
    target: &CreateTarget,
    source: &Source,
    dest: &Path,
    options: Options,
) -> Result<Plan, TargetError> {
    let src = source.path();
    let label = source.label();
    if dest.exists() {
        if dest.is_symlink() {
            if !proceeds(target.replace, options.force) {
                return Ok(skip_link_exists(dest));
            }
            tracing::debug!("Replacing link with file...");
            return Ok(Plan::ReplaceExisting {
                write: copy_write(src, dest, false),
                backup: false,
                message: format!("Replaced link with file {label:?} -> {dest:?}"),
                would: format!("Would replace link with file {label:?} -> {dest:?}"),
            });
        }
        if dest.is_file() {
            if file_digest(src)? == file_digest(dest)? {
                tracing::debug!("Correct file already exists.");
                return Ok(Plan::NoOpAlreadyCorrect {
                    message: format!("Correct file already exists {label:?} -> {dest:?}"),
                });
            }
            if !proceeds(target.replace, options.force) {
                return Ok(skip_file_exists(dest));
            }
            return Ok(Plan::ReplaceExisting {
                write: copy_write(src, dest, false),
                backup: target.backup,
                message: format!("Replaced file {label:?} -> {dest:?}"),
                would: format!("Would replace file {label:?} -> {dest:?}"),
            });
        }
        return Err(TargetError::UnreplaceableDestination(
            dest.display().to_string(),
        ));
    }
    if dest.is_symlink() {
        tracing::debug!("Found broken link {dest:?}");
        if !proceeds(target.replace, options.force) {
            return Ok(skip_link_exists(dest));
        }
        tracing::debug!("Replacing link with file...");
        return Ok(Plan::ReplaceExisting {
            write: copy_write(src, dest, false),
            backup: false,
            message: format!("Replaced broken link with file {label:?} -> {dest:?}"),
            would: format!("Would replace broken link with file {label:?} -> {dest:?}"),
        });
    }
    check_parent(dest, target.create_dirs)?;
    tracing::debug!("Creating new link/copy...");
    Ok(Plan::CreateNew {
        write: copy_write(src, dest, target.create_dirs),
        message: format!("New file created {label:?} -> {dest:?}"),
        would: format!("Would create file {label:?} -> {dest:?}"),
    })
}

fn symlink_write(src: &Path, dest: &Path, create_parents: bool) -> Write {
    Write::Symlink {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        create_parents,
    }
}

fn copy_write(src: &Path, dest: &Path, create_parents: bool) -> Write {
    Write::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        create_parents,
    }
}

fn skip_wrong_source(current: &Path, dest: &Path, src: &Path) -> Plan {
    Plan::Skip {
        reason: format!(
            "Link exists with wrong source: {current:?} -> {dest:?} instead of {src:?}"
        ),
    }
}

fn skip_file_exists(dest: &Path) -> Plan {
    Plan::Skip {
        reason: format!("Can't create link or copy, destination file exists: {dest:?}"),
    }
}

fn skip_link_exists(dest: &Path) -> Plan {
    Plan::Skip {
        reason: format!("Can't create copy, destination exists as link: {dest:?}"),
    }
}

fn check_parent(dest: &Path, create_dirs: bool) -> Result<(), TargetError> {
    if create_dirs || dest.parent().is_none_or(Path::is_dir) {
        Ok(())
    } else {
        Err(TargetError::MissingParentDir(dest.display().to_string()))
    }
}

fn read_link(dest: &Path) -> Result<PathBuf, TargetError> {
    fs::read_link(dest).map_err(|source| TargetError::Io {
        message: format!("Failed to read link {dest:?}"),
        source,
    })
}

fn file_digest(path: &Path) -> Result<String, TargetError> {
    let bytes = fs::read(path).map_err(|source| TargetError::Io {
        message: format!("Failed to read file {path:?}"),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
