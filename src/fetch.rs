//! Source classification and retrieval.
//!
//! A `create` target's `src` is either a local path or a URL. URLs are
//! fetched once, up front, into a temporary file that lives for the
//! duration of the target; there is no retry.

use std::path::{Path, PathBuf};

use crate::config::SourceKind;
use crate::error::TargetError;
use crate::paths;

/// Whether `src` names a URL, honoring an explicit `src_type` override.
#[must_use]
pub fn is_url_source(src: &str, kind: SourceKind) -> bool {
    match kind {
        SourceKind::Url => true,
        SourceKind::Path => false,
        SourceKind::Auto => has_url_scheme(src),
    }
}

/// Whether the string starts with a URL scheme such as `https://`.
#[must_use]
pub fn has_url_scheme(src: &str) -> bool {
    src.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
    })
}

/// A resolved, readable source for one `create` target.
#[derive(Debug)]
pub enum Source {
    /// Local file, verified to exist.
    File(PathBuf),
    /// URL fetched to a temporary file.
    Download {
        /// Temporary file holding the fetched bytes; removed on drop.
        file: tempfile::NamedTempFile,
        /// The URL it came from.
        url: String,
    },
}

impl Source {
    /// Path to read the source bytes from.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Download { file, .. } => file.path(),
        }
    }

    /// Whether this source came from a URL fetch.
    #[must_use]
    pub const fn is_download(&self) -> bool {
        matches!(self, Self::Download { .. })
    }

    /// The name shown for this source in report lines: the resolved
    /// path for local files, the URL for downloads.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Download { url, .. } => url.clone(),
        }
    }
}

/// Resolve a target's source: verify that a local path names a regular
/// file, or fetch a URL to a temporary file.
///
/// # Errors
///
/// Returns [`TargetError::SourceNotFound`] for a missing local file and
/// [`TargetError::Fetch`] for a transport error or non-success status.
pub fn resolve(src: &str, kind: SourceKind, base_dir: &Path) -> Result<Source, TargetError> {
    if is_url_source(src, kind) {
        tracing::debug!("Downloading {src:?}");
        return download(src);
    }
    let expanded = paths::expand_unchecked(src);
    let path = paths::resolve_source(src, &expanded, base_dir)?;
    Ok(Source::File(path))
}

fn download(url: &str) -> Result<Source, TargetError> {
    let fetch_error = |message: String| TargetError::Fetch {
        url: url.to_string(),
        message,
    };
    let mut response = ureq::get(url)
        .call()
        .map_err(|err| fetch_error(err.to_string()))?;
    let mut file = tempfile::NamedTempFile::new().map_err(|err| fetch_error(err.to_string()))?;
    std::io::copy(&mut response.body_mut().as_reader(), file.as_file_mut())
        .map_err(|err| fetch_error(err.to_string()))?;
    Ok(Source::Download {
        file,
        url: url.to_string(),
    })
}
