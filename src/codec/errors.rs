//! Codec errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode value: {0}")]
    Encode(String),

    #[error("Malformed payload at line {line}, column {column}: {message}")]
    Decode {
        line: usize,
        column: usize,
        message: String,
    },
}

impl CodecError {
    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::Encode(_) => "DOCSTORE_CODEC_ENCODE_FAILED",
            CodecError::Decode { .. } => "DOCSTORE_CODEC_DECODE_FAILED",
        }
    }

    /// Whether this is a decode failure
    pub fn is_decode(&self) -> bool {
        matches!(self, CodecError::Decode { .. })
    }
}
