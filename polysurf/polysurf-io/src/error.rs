//! Error types for point set loading and mesh saving.

use std::path::PathBuf;
use thiserror::Error;

use crate::FileFormat;

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for saving operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Errors that can occur while loading a point set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path does not name an existing regular file.
    #[error("input file not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The file exists but could not be opened for reading.
    #[error("cannot open input file {path}: {source}")]
    Unopenable {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The format is recognized but points cannot be loaded from it.
    #[error("loading points from {format} files is not supported")]
    UnsupportedFormat {
        /// The requested format.
        format: FileFormat,
    },

    /// The file content is not a valid point set in the requested format.
    #[error("failed to parse {path}: {reason}")]
    ParseFailed {
        /// Path being parsed.
        path: PathBuf,
        /// Description of what was invalid.
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while saving a mesh or point set.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The output file could not be created.
    #[error("cannot open output file {path}: {source}")]
    Unopenable {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The format is recognized but this kind of data cannot be written in it.
    #[error("saving {what} as {format} is not supported")]
    UnsupportedFormat {
        /// The requested format.
        format: FileFormat,
        /// What was being saved ("meshes" or "point sets").
        what: &'static str,
    },

    /// Writing the serialized data failed.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
