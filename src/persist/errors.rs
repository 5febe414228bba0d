//! Persistence engine errors
//!
//! Errors are `Clone`: one failed physical write is reported to every caller
//! whose payload was coalesced into it.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type for persistence operations
pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence engine errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistError {
    #[error("Invalid backing file path: {0}")]
    InvalidPath(String),

    #[error("Failed to create directory {path}: {message}")]
    CreateDir {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("Failed to write temp file {path}: {message}")]
    TempWrite {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("Failed to sync temp file {path}: {message}")]
    Sync {
        path: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("Failed to rename {from} onto {to}: {message}")]
    Rename {
        from: String,
        to: String,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("Write interrupted before completion")]
    Interrupted,
}

impl PersistError {
    pub(crate) fn create_dir(path: &Path, source: io::Error) -> Self {
        PersistError::CreateDir {
            path: path.display().to_string(),
            kind: source.kind(),
            message: source.to_string(),
        }
    }

    pub(crate) fn temp_write(path: &Path, source: io::Error) -> Self {
        PersistError::TempWrite {
            path: path.display().to_string(),
            kind: source.kind(),
            message: source.to_string(),
        }
    }

    pub(crate) fn sync(path: &Path, source: io::Error) -> Self {
        PersistError::Sync {
            path: path.display().to_string(),
            kind: source.kind(),
            message: source.to_string(),
        }
    }

    pub(crate) fn rename(from: &Path, to: &Path, source: io::Error) -> Self {
        PersistError::Rename {
            from: from.display().to_string(),
            to: to.display().to_string(),
            kind: source.kind(),
            message: source.to_string(),
        }
    }

    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            PersistError::InvalidPath(_) => "DOCSTORE_PERSIST_INVALID_PATH",
            PersistError::CreateDir { .. } => "DOCSTORE_PERSIST_CREATE_DIR_FAILED",
            PersistError::TempWrite { .. } => "DOCSTORE_PERSIST_TEMP_WRITE_FAILED",
            PersistError::Sync { .. } => "DOCSTORE_PERSIST_SYNC_FAILED",
            PersistError::Rename { .. } => "DOCSTORE_PERSIST_RENAME_FAILED",
            PersistError::Interrupted => "DOCSTORE_PERSIST_INTERRUPTED",
        }
    }

    /// Underlying I/O error kind, when the failure came from the filesystem
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            PersistError::CreateDir { kind, .. }
            | PersistError::TempWrite { kind, .. }
            | PersistError::Sync { kind, .. }
            | PersistError::Rename { kind, .. } => Some(*kind),
            PersistError::InvalidPath(_) | PersistError::Interrupted => None,
        }
    }
}
