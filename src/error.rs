//! Domain-specific error types for the dotfiles installer.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Errors fall into two tiers that drive run control flow:
//!
//! ```text
//! ConfigError: malformed or unsupported configuration
//!              fatal, reported before any filesystem mutation
//! TargetError: a single target could not be applied
//!              recorded as that target's outcome, siblings continue
//! ```
//!
//! The CLI boundary converts both to [`anyhow::Error`] via the standard
//! `?` operator.

use thiserror::Error;

/// Errors that make the configuration unusable.
///
/// Any of these aborts the whole run before the first filesystem
/// mutation. Failures scoped to one target use [`TargetError`] instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("Cannot read config file {path:?}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid YAML or does not match the schema.
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: String,
        /// Underlying deserialization error.
        source: serde_yaml::Error,
    },

    /// An environment variable referenced in a path is not set.
    #[error("Environment variable '{name}' is not set (in path {path:?})")]
    UnsetVariable {
        /// Name of the missing variable.
        name: String,
        /// The raw path string that referenced it.
        path: String,
    },

    /// A `regex` field failed to compile.
    #[error("Invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        /// The pattern as written in the config.
        pattern: String,
        /// Underlying compile error.
        source: regex::Error,
    },

    /// A `filecontent` target's `content` does not match its `regex`.
    #[error("Given content does not match the regular expression (file: {dest:?})")]
    ContentRegexMismatch {
        /// Destination path of the offending target.
        dest: String,
    },

    /// A `mode` field is not a valid octal permission string.
    #[error("Invalid mode {mode:?}: expected octal digits such as \"0644\"")]
    InvalidMode {
        /// The mode string as written in the config.
        mode: String,
    },

    /// A link-type target names a URL source, which cannot be linked.
    #[error("Cannot create a link to a URL source, use type 'copy' (src: {src:?})")]
    LinkToUrl {
        /// The URL source of the offending target.
        src: String,
    },

    /// `dest_type: glob_multiple` is declared but not implemented.
    #[error("dest_type 'glob_multiple' is not implemented (dest: {dest:?})")]
    GlobMultipleUnsupported {
        /// Destination pattern of the offending target.
        dest: String,
    },

    /// A destination path stays relative after variable and `~`
    /// expansion. Only `src` paths resolve against the config directory.
    #[error("Destination path is not absolute: {dest:?}")]
    RelativeDest {
        /// The destination as written in the config.
        dest: String,
    },
}

/// Errors that fail a single target without aborting its siblings.
#[derive(Error, Debug)]
pub enum TargetError {
    /// The source file does not exist.
    ///
    /// The payload is preformatted as `"raw" ("absolute")`, with the
    /// absolute form omitted when it equals the raw form.
    #[error("Source file {0} not found.")]
    SourceNotFound(String),

    /// Downloading a URL source failed.
    #[error("Failed to download {url:?}: {message}")]
    Fetch {
        /// The URL that could not be fetched.
        url: String,
        /// Transport or HTTP status description.
        message: String,
    },

    /// A `filecontent` destination does not exist. These targets edit
    /// files in place and never create them.
    #[error("Destination file does not exist: {0}")]
    DestinationNotFound(String),

    /// A `filecontent` destination exists but is not a regular file.
    #[error("Destination path is not a file: {0}")]
    DestinationNotFile(String),

    /// A pattern failed to compile at apply time. [`Config::load`]
    /// compiles every pattern first, so this only fires for targets
    /// constructed some other way.
    ///
    /// [`Config::load`]: crate::config::Config::load
    #[error("Invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        /// The pattern as written in the config.
        pattern: String,
        /// Underlying compile error.
        source: regex::Error,
    },

    /// The destination's parent directory is missing and `create_dirs`
    /// is not enabled.
    #[error("Directory does not exist: {0:?}")]
    MissingParentDir(String),

    /// Renaming the existing destination to its backup name failed.
    /// The destination is left untouched.
    #[error("Failed to rename file {path:?} to {backup:?}: {source}")]
    BackupFailed {
        /// The file that was to be backed up.
        path: String,
        /// The timestamped backup name that could not be created.
        backup: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Glob metacharacters appear in the final path component, which
    /// only supports literal names.
    #[error("Glob patterns are not yet supported in the file name: {0:?}")]
    GlobInFileName(String),

    /// The directory glob pattern is not valid glob syntax.
    #[error("Invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        /// The directory portion of the destination.
        pattern: String,
        /// Underlying pattern error.
        source: glob::PatternError,
    },

    /// The directory glob matched no filesystem entry.
    #[error("No directory matched glob pattern: {pattern:?} (dest: {dest:?})")]
    GlobNoMatch {
        /// The directory portion of the destination.
        pattern: String,
        /// The destination as written in the config.
        dest: String,
    },

    /// The directory glob matched more than one filesystem entry.
    #[error("Multiple matches for dest_type 'glob_single': {matches:?} (dest: {dest:?})")]
    GlobManyMatches {
        /// Every entry the pattern matched.
        matches: Vec<String>,
        /// The destination as written in the config.
        dest: String,
    },

    /// The destination exists but is neither a regular file nor a
    /// symlink, so it is never replaced.
    #[error("Destination exists but it's not a file or link, not replacing: {0:?}")]
    UnreplaceableDestination(String),

    /// `dest_type: glob_multiple` reached planning. [`Config::load`]
    /// rejects it first, so this only fires for targets constructed
    /// some other way.
    ///
    /// [`Config::load`]: crate::config::Config::load
    #[error("dest_type 'glob_multiple' is not implemented (dest: {0:?})")]
    GlobMultipleUnsupported(String),

    /// A filesystem operation failed.
    #[error("{message}: {source}")]
    Io {
        /// What was being attempted, with the paths involved.
        message: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
