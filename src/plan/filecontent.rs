//! Planner for `filecontent` targets: in-place edits of existing files.

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::config::FileContentTarget;
use crate::error::TargetError;
use crate::paths;

use super::{Options, Plan, TargetPlan, Write, diff};

/// Decide what to do for one `filecontent` target.
///
/// These targets edit an existing file and never create one; a missing
/// or non-regular destination is a failure, not a creation.
#[must_use]
pub fn plan_filecontent(target: &FileContentTarget, options: Options) -> TargetPlan {
    build(target, options).unwrap_or_else(TargetPlan::fail)
}

fn build(target: &FileContentTarget, options: Options) -> Result<TargetPlan, TargetError> {
    let dest = paths::expand_unchecked(&target.dest);
    let dest_path = Path::new(&dest);
    if !dest_path.exists() {
        return Err(TargetError::DestinationNotFound(dest));
    }
    if !dest_path.is_file() {
        return Err(TargetError::DestinationNotFile(dest));
    }
    let current = fs::read_to_string(dest_path).map_err(|source| TargetError::Io {
        message: format!("Failed to read file {dest:?}"),
        source,
    })?;

    let (plan, diff) = match compute_edit(target, &current)? {
        Edit::AlreadyPresent => (
            Plan::NoOpAlreadyCorrect {
                message: format!("File contents already as expected: {dest:?}"),
            },
            None,
        ),
        Edit::Update(text) => {
            let diff = content_diff(&current, &text, &dest, options);
            (
                Plan::ReplaceExisting {
                    write: Write::Splice {
                        dest: dest_path.to_path_buf(),
                        text,
                    },
                    backup: target.backup,
                    message: format!("File content updated: {dest:?}"),
                    would: format!("Would update file content: {dest:?}"),
                },
                diff,
            )
        }
        Edit::Add(text) => {
            let diff = content_diff(&current, &text, &dest, options);
            (
                Plan::ReplaceExisting {
                    write: Write::Splice {
                        dest: dest_path.to_path_buf(),
                        text,
                    },
                    backup: target.backup,
                    message: format!("File content added: {dest:?}"),
                    would: format!("Would add file content: {dest:?}"),
                },
                diff,
            )
        }
    };
    Ok(TargetPlan {
        plan,
        mode: None,
        diff,
        source: None,
    })
}

fn content_diff(current: &str, text: &str, dest: &str, options: Options) -> Option<String> {
    if !options.show_diff {
        return None;
    }
    let rendered = diff::unified_diff(current, text, dest, &format!("{dest} (updated)"));
    (!rendered.is_empty()).then_some(rendered)
}

/// The change `compute_edit` settled on.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
    /// The file already carries the content.
    AlreadyPresent,
    /// Replace the span the `regex` matched with the content.
    Update(String),
    /// Insert or append the content.
    Add(String),
}

/// Work out the new file text, in order of precedence: the last
/// `regex` match is replaced in place; otherwise the content goes
/// immediately after the last `after` match, on its own line; with no
/// match at all it is appended at end of file.
fn compute_edit(target: &FileContentTarget, current: &str) -> Result<Edit, TargetError> {
    if let Some(pattern) = target.regex.as_deref() {
        tracing::trace!("Using content regex: {pattern}");
        let re = compile(pattern)?;
        if let Some(found) = re.find_iter(current).last() {
            if found.as_str() == target.content {
                return Ok(Edit::AlreadyPresent);
            }
            let (head, rest) = current.split_at(found.start());
            let (_, tail) = rest.split_at(found.end() - found.start());
            let mut text = String::with_capacity(current.len() + target.content.len());
            text.push_str(head);
            text.push_str(&target.content);
            text.push_str(tail);
            return Ok(settle(text, current, Edit::Update));
        }
    }

    match insertion_point(target, current)? {
        Some(at) => {
            let (head, tail) = current.split_at(at);
            // The tail is where a previous run would have put it.
            if target.regex.is_none() && tail.contains(&target.content) {
                return Ok(Edit::AlreadyPresent);
            }
            let mut text = String::with_capacity(current.len() + target.content.len());
            text.push_str(head);
            text.push_str(&target.content);
            text.push_str(tail);
            Ok(settle(text, current, Edit::Add))
        }
        None => {
            if target.regex.is_none() && current.contains(&target.content) {
                return Ok(Edit::AlreadyPresent);
            }
            let mut text = String::with_capacity(current.len() + target.content.len());
            text.push_str(current);
            text.push_str(&target.content);
            Ok(settle(text, current, Edit::Add))
        }
    }
}

fn settle(text: String, current: &str, make: fn(String) -> Edit) -> Edit {
    if text == current {
        Edit::AlreadyPresent
    } else {
        make(text)
    }
}

/// Where `content` goes when the `regex` path did not apply: just past
/// the last `after` match, or `None` for end of file.
fn insertion_point(
    target: &FileContentTarget,
    current: &str,
) -> Result<Option<usize>, TargetError> {
    let Some(pattern) = target.after.as_deref() else {
        return Ok(None);
    };
    let re = compile(pattern)?;
    Ok(re
        .find_iter(current)
        .last()
        .map(|found| line_boundary(current, found.end())))
}

/// Move an offset that lands mid-line to the start of the next line,
/// so inserted content sits on its own lines rather than splicing into
/// the matched one.
fn line_boundary(text: &str, at: usize) -> usize {
    let head = text.get(..at).unwrap_or_default();
    if at == 0 || at == text.len() || head.ends_with('\n') {
        return at;
    }
    let tail = text.get(at..).unwrap_or_default();
    tail.find('\n').map_or(text.len(), |idx| at + idx + 1)
}

/// The patterns were compiled once during config validation, so this
/// cannot fail for targets that came from a loaded configuration.
fn compile(pattern: &str) -> Result<Regex, TargetError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| TargetError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}
