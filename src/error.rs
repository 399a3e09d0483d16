//! # Error Handling
//!
//! This module defines the centralized error type for `degit`. It uses the
//! `thiserror` library to derive a single `Error` enum covering every way a
//! clone can fail, from an unparseable repository string to a failing nested
//! `clone` directive.
//!
//! ## Error Codes
//!
//! Library callers match on failures programmatically through
//! [`Error::code`], which returns a stable, SCREAMING_SNAKE identifier that
//! does not depend on the message text:
//!
//! - `BAD_SRC` / `UNSUPPORTED_HOST`: the repository string was rejected.
//! - `MISSING_REF` / `BAD_REF`: the ref could not be resolved, or the remote
//!   listing could not be parsed.
//! - `DEST_NOT_EMPTY`: the destination is occupied and `force` was not given.
//! - `COULD_NOT_DOWNLOAD`, `GIT_COMMAND`, `GIT_CLONE`, `EXTRACT`: transport
//!   failures, wrapped with the URL or archive involved.
//! - `BAD_DIRECTIVES` / `CYCLE_DETECTED`: problems with a template's
//!   `degit.json` manifest.
//!
//! A missing `remove` target is not an error at all; it is surfaced as a
//! `FILE_DOES_NOT_EXIST` warning event (see [`crate::events`]).

use thiserror::Error;

/// Main error type for degit operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repository string did not match the `[host:]owner/name[/subdir][#ref]` grammar.
    #[error("could not parse {src}")]
    BadSrc { src: String },

    /// The repository string named a host that has no known snapshot endpoint.
    #[error("degit supports GitHub, GitLab, Bitbucket and Sourcehut (got {host})")]
    UnsupportedHost { host: String },

    /// The requested ref matched no remote ref and no cache entry.
    #[error("could not find commit hash for {r#ref}")]
    MissingRef { r#ref: String },

    /// A line of the remote ref listing was malformed.
    #[error("could not parse ref line {line:?}")]
    BadRef { line: String },

    /// The destination already contains files and `force` was not set.
    #[error("destination directory {dest} is not empty, aborting. Use options.force to override")]
    DestNotEmpty { dest: String },

    /// Downloading or checking out the snapshot failed.
    #[error("could not download {url}: {message}")]
    CouldNotDownload { url: String, message: String },

    /// An error occurred while executing a Git command.
    #[error("git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// Both the HTTPS and SSH clone attempts failed.
    ///
    /// Includes the repository URL, the commit being fetched, and an optional
    /// hint for resolution.
    #[error("git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// The snapshot archive could not be unpacked.
    #[error("could not extract {archive}: {message}")]
    Extract { archive: String, message: String },

    /// The template's `degit.json` manifest is not a valid directive list.
    #[error("invalid degit.json: {message}")]
    Manifest { message: String },

    /// A `clone` directive would re-enter a repository already being cloned.
    #[error("cycle detected in clone directives: {cycle}")]
    CycleDetected { cycle: String },

    /// The on-disk hash cache could not be read or written.
    #[error("cache operation error: {message}")]
    Cache { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Stable identifier for programmatic matching, independent of the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadSrc { .. } => "BAD_SRC",
            Error::UnsupportedHost { .. } => "UNSUPPORTED_HOST",
            Error::MissingRef { .. } => "MISSING_REF",
            Error::BadRef { .. } => "BAD_REF",
            Error::DestNotEmpty { .. } => "DEST_NOT_EMPTY",
            Error::CouldNotDownload { .. } => "COULD_NOT_DOWNLOAD",
            Error::GitCommand { .. } => "GIT_COMMAND",
            Error::GitClone { .. } => "GIT_CLONE",
            Error::Extract { .. } => "EXTRACT",
            Error::Manifest { .. } => "BAD_DIRECTIVES",
            Error::CycleDetected { .. } => "CYCLE_DETECTED",
            Error::Cache { .. } => "CACHE",
            Error::Io(_) => "IO",
            Error::Json(_) => "JSON",
            Error::UrlParse(_) => "URL",
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
