//! JSON codec

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{CodecError, CodecResult};
use super::Codec;

/// JSON encoding via serde_json.
///
/// Pretty output uses two-space indentation.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec<T> {
    pretty: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::pretty()
    }
}

impl<T> JsonCodec<T> {
    /// Indented output
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            _marker: PhantomData,
        }
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self {
            pretty: false,
            _marker: PhantomData,
        }
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> CodecResult<String> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, payload: &str) -> CodecResult<T> {
        serde_json::from_str(payload).map_err(|e| CodecError::Decode {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        })
    }
}
