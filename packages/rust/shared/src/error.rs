//! Error types for NewsBrief.
//!
//! Library crates use [`NewsBriefError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level error type for all NewsBrief operations.
#[derive(Debug, thiserror::Error)]
pub enum NewsBriefError {
    /// Language-model or search service failure.
    #[error("upstream error from {service}: {reason}")]
    Upstream { service: String, reason: String },

    /// Fetch failure: connection error, non-2xx status, or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// A response could not be decomposed into the expected structure.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Extracted article text is below the minimum usable length.
    #[error("empty content from {url}: {chars} chars extracted")]
    EmptyContent { url: String, chars: usize },

    /// Summarization was given nothing to summarize.
    #[error("no article text survived fetching; nothing to summarize")]
    EmptyInput,

    /// The run was cancelled or exceeded its deadline.
    #[error("run cancelled")]
    Cancelled,

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, invalid date window, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NewsBriefError>;

impl NewsBriefError {
    /// Create an upstream error for the named service.
    pub fn upstream(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error for display and per-candidate bookkeeping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Network(_) => ErrorKind::Network,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::EmptyContent { .. } => ErrorKind::EmptyContent,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }
}

/// Data-free classification of a [`NewsBriefError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Upstream,
    Network,
    Parse,
    EmptyContent,
    EmptyInput,
    Cancelled,
    Config,
    Io,
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream_error",
            Self::Network => "network_error",
            Self::Parse => "parse_error",
            Self::EmptyContent => "empty_content_error",
            Self::EmptyInput => "empty_input_error",
            Self::Cancelled => "cancelled",
            Self::Config => "config_error",
            Self::Io => "io_error",
            Self::Validation => "validation_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
