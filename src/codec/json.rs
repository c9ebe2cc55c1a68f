//! JSON codec using `serde_json`.
//!
//! Text alternative to [`MsgPackCodec`](super::MsgPackCodec) for clients
//! that prefer human-readable bodies.

use crate::error::Result;

/// JSON codec for structured bodies.
pub struct JsonCodec;

impl JsonCodec {
    /// Value for the `content-type` header on bodies this codec produced.
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Encode a value to JSON bytes.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    /// Decode JSON bytes to a value.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
