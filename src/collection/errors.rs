//! Collection errors
//!
//! Lookups that match nothing are not errors; they return `Ok(None)`.

use thiserror::Error;

use crate::codec::CodecError;
use crate::persist::PersistError;
use crate::store::StoreError;

/// Result type for collection operations
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Collection errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectionError {
    /// Rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Backing file content does not parse
    #[error(transparent)]
    Decode(CodecError),

    /// Write, sync, or rename failed
    #[error(transparent)]
    Io(PersistError),

    /// A model could not be converted to or from JSON
    #[error("Model conversion failed: {0}")]
    Model(String),
}

impl CollectionError {
    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            CollectionError::InvalidArgument(_) => "DOCSTORE_INVALID_ARGUMENT",
            CollectionError::Decode(e) => e.code(),
            CollectionError::Io(e) => e.code(),
            CollectionError::Model(_) => "DOCSTORE_MODEL_CONVERSION_FAILED",
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CollectionError::InvalidArgument(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, CollectionError::Decode(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, CollectionError::Io(_))
    }
}

impl From<StoreError> for CollectionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Codec(e) if e.is_decode() => CollectionError::Decode(e),
            StoreError::Codec(e) => CollectionError::Model(e.to_string()),
            StoreError::Persist(e) => CollectionError::Io(e),
        }
    }
}
