//! Raw codec - pass-through for binary bodies.
//!
//! Used when the payload is already serialized. Zero-copy where possible.

use bytes::Bytes;

/// Codec that passes bytes through without transformation.
pub struct RawCodec;

impl RawCodec {
    /// Value for the `content-type` header on bodies this codec produced.
    pub const CONTENT_TYPE: &'static str = "application/octet-stream";

    /// Serialize raw bytes (copies into `Bytes`).
    ///
    /// For true zero-copy, use `serialize_bytes` with an existing `Bytes`.
    #[inline]
    pub fn serialize(data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(data)
    }

    /// Serialize `Bytes` (zero-copy, returns the input).
    #[inline]
    pub fn serialize_bytes(data: Bytes) -> Bytes {
        data
    }

    /// Deserialize - returns the input unchanged (zero-copy).
    #[inline]
    pub fn deserialize(data: &[u8]) -> &[u8] {
        data
    }
}
