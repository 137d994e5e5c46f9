//! Path expansion and resolution.
//!
//! Raw path strings from the configuration pass through up to three
//! steps: `$VAR`/`${VAR}` and leading-`~` expansion, absolutization
//! (`src` paths resolve against the config file's directory, `dest`
//! paths must already be absolute), and for `dest_type: glob_single` a
//! directory glob that must match exactly one entry.

use std::path::{Component, Path, PathBuf};

use crate::config::DestKind;
use crate::error::{ConfigError, TargetError};

/// Expand environment variables and a leading `~` in `raw`.
///
/// Variables expand before the tilde, so a variable that expands to a
/// `~`-prefixed value gets its tilde expanded too.
///
/// # Errors
///
/// Returns [`ConfigError::UnsetVariable`] naming the first referenced
/// variable that is not set (`HOME` counts when a `~` needs it).
pub fn expand(raw: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = expand_inner(raw, &mut missing);
    match missing {
        Some(name) => Err(ConfigError::UnsetVariable {
            name,
            path: raw.to_string(),
        }),
        None => Ok(expanded),
    }
}

/// Same expansion as [`expand`] with unset variables left in place.
///
/// Call sites run after [`expand`] has already validated the same
/// string, so in practice nothing is left unexpanded.
#[must_use]
pub fn expand_unchecked(raw: &str) -> String {
    let mut missing = None;
    expand_inner(raw, &mut missing)
}

fn expand_inner(raw: &str, missing: &mut Option<String>) -> String {
    let with_vars = expand_vars(raw, missing);
    expand_tilde(&with_vars, missing)
}

fn expand_vars(raw: &str, missing: &mut Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if closed && !name.is_empty() {
                    substitute(&name, &format!("${{{name}}}"), &mut out, missing);
                } else if closed {
                    out.push_str("${}");
                } else {
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some(&n) if is_name_char(n) => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_name_char(n) {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                substitute(&name, &format!("${name}"), &mut out, missing);
            }
            _ => out.push('$'),
        }
    }
    out
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn substitute(name: &str, literal: &str, out: &mut String, missing: &mut Option<String>) {
    match std::env::var(name) {
        Ok(value) => out.push_str(&value),
        Err(_) => {
            if missing.is_none() {
                *missing = Some(name.to_string());
            }
            out.push_str(literal);
        }
    }
}

fn expand_tilde(path: &str, missing: &mut Option<String>) -> String {
    if path != "~" && !path.starts_with("~/") {
        return path.to_string();
    }
    match std::env::var("HOME") {
        Ok(home) => match path.strip_prefix('~') {
            Some(rest) => format!("{home}{rest}"),
            None => path.to_string(),
        },
        Err(_) => {
            if missing.is_none() {
                *missing = Some("HOME".to_string());
            }
            path.to_string()
        }
    }
}

/// Lexically normalize a path: collapse `.` components, resolve `..`
/// against preceding components, and drop duplicate separators. Never
/// touches the filesystem, so symlinked parents are not resolved.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::CurDir => {}
            Component::RootDir => out.push("/"),
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Absolutize an expanded path against `base_dir`, then normalize.
/// Absolute inputs ignore `base_dir`.
#[must_use]
pub fn absolute(expanded: &str, base_dir: &Path) -> PathBuf {
    normalize(&base_dir.join(expanded))
}

/// Resolve a local `src` path and require that it names a regular file.
///
/// # Errors
///
/// Returns [`TargetError::SourceNotFound`] when the resolved path is
/// missing or not a regular file. The message shows the path as written
/// in the config, plus the resolved form when the two differ.
pub fn resolve_source(raw: &str, expanded: &str, base_dir: &Path) -> Result<PathBuf, TargetError> {
    let path = absolute(expanded, base_dir);
    if path.is_file() {
        return Ok(path);
    }
    let shown = path.display().to_string();
    let label = if raw == shown {
        format!("{raw:?}")
    } else {
        format!("{raw:?} ({shown:?})")
    };
    Err(TargetError::SourceNotFound(label))
}

/// Resolve an expanded `dest` path according to its `dest_type`.
///
/// For `glob_single` the directory part of the path is a glob pattern
/// that must match exactly one filesystem entry; the file name part
/// must stay literal.
///
/// # Errors
///
/// Returns [`TargetError::GlobInFileName`] for glob metacharacters in
/// the file name, [`TargetError::InvalidGlob`] for a malformed pattern,
/// [`TargetError::GlobNoMatch`] / [`TargetError::GlobManyMatches`] when
/// the pattern matches zero or several entries, and
/// [`TargetError::GlobMultipleUnsupported`] for `glob_multiple`.
pub fn resolve_dest(raw: &str, expanded: &str, kind: DestKind) -> Result<PathBuf, TargetError> {
    match kind {
        DestKind::Normal => Ok(normalize(Path::new(expanded))),
        DestKind::GlobSingle => resolve_glob_single(raw, expanded),
        DestKind::GlobMultiple => Err(TargetError::GlobMultipleUnsupported(raw.to_string())),
    }
}

fn resolve_glob_single(raw: &str, expanded: &str) -> Result<PathBuf, TargetError> {
    let expanded_path = Path::new(expanded);
    let file_name = expanded_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name
        .chars()
        .any(|c| matches!(c, '*' | '?' | '[' | ']'))
    {
        return Err(TargetError::GlobInFileName(raw.to_string()));
    }
    let pattern = expanded_path
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let entries = glob::glob(&pattern).map_err(|source| TargetError::InvalidGlob {
        pattern: pattern.clone(),
        source,
    })?;
    let matches: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
    match matches.as_slice() {
        [] => Err(TargetError::GlobNoMatch {
            pattern,
            dest: raw.to_string(),
        }),
        [only] => Ok(normalize(&only.join(&file_name))),
        many => Err(TargetError::GlobManyMatches {
            matches: many.iter().map(|p| p.display().to_string()).collect(),
            dest: raw.to_string(),
        }),
    }
}
