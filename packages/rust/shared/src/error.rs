//! Error types for Clausemap.
//!
//! Library crates use [`ClausemapError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Clausemap operations.
#[derive(Debug, thiserror::Error)]
pub enum ClausemapError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input file (framework JSON, taxonomy TOML, ...).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A document whose format no registered reader can handle.
    #[error("unsupported document format '{format}' for {path:?}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// The framework file to merge into does not exist.
    #[error("framework not found: {0:?}")]
    StorageNotFound(PathBuf),

    /// Another writer holds the framework lock.
    #[error(
        "framework {path:?} is locked by {holder} (lock file {lock:?}); \
         delete the lock file if that process is no longer running"
    )]
    StorageLocked {
        path: PathBuf,
        lock: PathBuf,
        /// `pid <n>` as recorded in the lock file, or `an unknown process`.
        holder: String,
    },

    /// Ledger database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Data validation error (empty taxonomy, duplicate names, ...).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClausemapError>;

impl ClausemapError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// Whether the caller can reasonably retry the same operation later.
    ///
    /// Lock contention and a missing framework are operator-fixable; everything
    /// else needs a changed input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StorageLocked { .. } | Self::StorageNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ClausemapError::config("taxonomy_path does not exist");
        assert_eq!(err.to_string(), "config error: taxonomy_path does not exist");

        let err = ClausemapError::validation("duplicate category 'consent'");
        assert!(err.to_string().contains("duplicate category"));
    }

    #[test]
    fn locked_and_missing_are_recoverable() {
        let locked = ClausemapError::StorageLocked {
            path: "f.json".into(),
            lock: "f.json.lock".into(),
            holder: "pid 42".into(),
        };
        assert!(locked.is_recoverable());
        assert!(ClausemapError::StorageNotFound("f.json".into()).is_recoverable());
        assert!(!ClausemapError::parse("bad json").is_recoverable());
    }

    #[test]
    fn unsupported_format_names_extension() {
        let err = ClausemapError::UnsupportedFormat {
            path: "policy.odt".into(),
            format: "odt".into(),
        };
        assert!(err.to_string().contains("'odt'"));
    }
}
