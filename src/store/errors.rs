//! Cached store errors

use thiserror::Error;

use crate::codec::CodecError;
use crate::persist::PersistError;

/// Result type for cached store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Cached store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl StoreError {
    /// Error code string of the underlying failure
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Codec(e) => e.code(),
            StoreError::Persist(e) => e.code(),
        }
    }
}
