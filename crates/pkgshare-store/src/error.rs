//! Error types for pkgshare-store

use std::path::PathBuf;

/// Result type for pkgshare-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type surfaced by a [`crate::PackageIndex`] implementation.
pub type IndexError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in pkgshare-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration value was absent or blank
    #[error("Missing required configuration value: {field}")]
    MissingValue { field: &'static str },

    /// A configuration value was present but has the wrong shape
    #[error("Malformed configuration value {field}: {reason}")]
    MalformedValue { field: &'static str, reason: String },

    /// A required operation argument was absent or blank
    #[error("Missing required argument: {name}")]
    MissingArgument { name: &'static str },

    /// An operation argument was present but unusable
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Invalid package version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The physical share connection could not be established
    #[error("Failed to map share {remote} to {local}: {source}")]
    Mount {
        local: String,
        remote: String,
        #[source]
        source: std::io::Error,
    },

    /// The package manifest could not be read from an artifact
    #[error("Invalid package manifest: {message}")]
    Manifest { message: String },

    /// The external package index failed while handling an artifact
    #[error("Package index error: {source}")]
    Index {
        #[source]
        source: IndexError,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            field,
            reason: reason.into(),
        }
    }

    /// True when the error stands for an absent file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
