//! Error types for Sanstha.
//!
//! Library crates use [`SansthaError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum SansthaError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A single feed could not be fetched or returned an unusable payload.
    #[error("source unavailable ({source_url}): {message}")]
    SourceUnavailable { source_url: String, message: String },

    /// Text generation failed or returned an unusable shape.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Image search failed. Always recovered by the caller.
    #[error("image resolution failed: {0}")]
    ImageResolution(String),

    /// Persistent store read or write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport-level HTTP error.
    #[error("network error: {0}")]
    Network(String),

    /// Data validation error (malformed URL, double-armed scheduler, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON document (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SansthaError>;

impl SansthaError {
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

    /// Mark a feed as unavailable for this aggregation round.
    pub fn source_unavailable(source_url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_url: source_url.into(),
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
}

impl From<serde_json::Error> for SansthaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
