//! Codec adapter
//!
//! Converts a typed value to and from the text payload handed to the
//! persistence engine. `decode(encode(v)) == v` for every value the codec
//! can represent.

mod errors;
mod json;

pub use errors::{CodecError, CodecResult};
pub use json::JsonCodec;

/// Typed value <-> payload conversion.
pub trait Codec<T> {
    /// Encode `value` into a payload
    fn encode(&self, value: &T) -> CodecResult<String>;

    /// Decode a payload. Malformed input is `CodecError::Decode`.
    fn decode(&self, payload: &str) -> CodecResult<T>;
}
