//! Error types for trove_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using trove_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sorting files.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Renaming a file into the destination tree failed. The source is untouched.
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Every disambiguation index up to the cap is already taken.
    #[error("No free destination for {name} in {dir}")]
    DestinationExhausted { dir: PathBuf, name: String },

    /// Path has no usable file name.
    #[error("Invalid file name: {path}")]
    InvalidFileName { path: PathBuf },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Log file could not be read or written as a JSON array.
    #[error("Log store at {path}: {reason}")]
    LogStore { path: PathBuf, reason: String },

    /// Extension to category mapping is malformed.
    #[error("Invalid category mapping: {reason}")]
    InvalidMapping { reason: String },
}

impl Error {
    /// Create a Move error.
    pub fn move_failed(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Move {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Create a DestinationExhausted error.
    pub fn destination_exhausted(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Error::DestinationExhausted {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Create an InvalidFileName error.
    pub fn invalid_file_name(path: impl Into<PathBuf>) -> Self {
        Error::InvalidFileName { path: path.into() }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create a LogStore error.
    pub fn log_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::LogStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidMapping error.
    pub fn invalid_mapping(reason: impl Into<String>) -> Self {
        Error::InvalidMapping {
            reason: reason.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
