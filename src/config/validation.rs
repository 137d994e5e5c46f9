//! Configuration validation.
//!
//! Every check here is fatal: the whole run is rejected before any
//! filesystem access. Problems scoped to one target at apply time
//! (missing sources, glob mismatches) surface later as that target's
//! outcome instead.

use regex::{Regex, RegexBuilder};

use super::model::{CreateKind, CreateTarget, DestKind, FileContentTarget, Target};
use crate::error::ConfigError;
use crate::fetch;
use crate::paths;

/// Minimum length for octal mode strings.
const OCTAL_MODE_MIN_LEN: usize = 3;

/// Maximum length for octal mode strings.
const OCTAL_MODE_MAX_LEN: usize = 4;

/// Validate every target in configuration order. The first problem
/// found is returned.
///
/// # Errors
///
/// Returns the [`ConfigError`] describing the first invalid target.
pub fn validate(targets: &[Target]) -> Result<(), ConfigError> {
    for target in targets {
        match target {
            Target::Create(create) => validate_create(create)?,
            Target::FileContent(content) => validate_filecontent(content)?,
        }
    }
    Ok(())
}

fn validate_create(target: &CreateTarget) -> Result<(), ConfigError> {
    if target.dest_type == DestKind::GlobMultiple {
        return Err(ConfigError::GlobMultipleUnsupported {
            dest: target.dest.clone(),
        });
    }
    let url = fetch::is_url_source(&target.src, target.src_type);
    if target.kind == CreateKind::Link && url {
        return Err(ConfigError::LinkToUrl {
            src: target.src.clone(),
        });
    }
    if !url {
        paths::expand(&target.src)?;
    }
    expand_dest(&target.dest)?;
    if let Some(mode) = &target.mode {
        validate_mode(mode)?;
    }
    Ok(())
}

fn validate_filecontent(target: &FileContentTarget) -> Result<(), ConfigError> {
    expand_dest(&target.dest)?;
    if let Some(pattern) = &target.regex {
        let re = compile(pattern)?;
        if !matches_at_start(&re, &target.content) {
            return Err(ConfigError::ContentRegexMismatch {
                dest: target.dest.clone(),
            });
        }
    }
    if let Some(pattern) = &target.after {
        compile(pattern)?;
    }
    Ok(())
}

fn expand_dest(dest: &str) -> Result<(), ConfigError> {
    let expanded = paths::expand(dest)?;
    if std::path::Path::new(&expanded).is_absolute() {
        Ok(())
    } else {
        Err(ConfigError::RelativeDest {
            dest: dest.to_string(),
        })
    }
}

/// Compile a config pattern in multi-line mode: `^`/`$` match at line
/// boundaries, `.` does not match newlines.
pub(crate) fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

/// Whether `re` matches starting at the first byte of `text`.
pub(crate) fn matches_at_start(re: &Regex, text: &str) -> bool {
    re.find(text).is_some_and(|m| m.start() == 0)
}

fn validate_mode(mode: &str) -> Result<(), ConfigError> {
    let octal = mode.len() >= OCTAL_MODE_MIN_LEN
        && mode.len() <= OCTAL_MODE_MAX_LEN
        && mode.chars().all(|c| ('0'..='7').contains(&c));
    if octal {
        Ok(())
    } else {
        Err(ConfigError::InvalidMode {
            mode: mode.to_string(),
        })
    }
}

/// Parse a validated octal mode string into permission bits.
#[must_use]
pub(crate) fn mode_bits(mode: &str) -> Option<u32> {
    validate_mode(mode).ok()?;
    u32::from_str_radix(mode, 8).ok()
}
