//! MsgPack codec using `rmp-serde`.
//!
//! Uses `to_vec_named` so structs serialize as maps with field names
//! rather than positional arrays. Consumers that know nothing about Rust
//! field order can decode the bodies.
//!
//! # Example
//!
//! ```
//! use stompwire::codec::MsgPackCodec;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Order {
//!     id: u32,
//!     item: String,
//! }
//!
//! let order = Order { id: 42, item: "widget".to_string() };
//! let encoded = MsgPackCodec::encode(&order).unwrap();
//! let decoded: Order = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, order);
//! ```

use crate::error::Result;

/// MessagePack codec for structured bodies.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Value for the `content-type` header on bodies this codec produced.
    pub const CONTENT_TYPE: &'static str = "application/msgpack";

    /// Encode a value to MsgPack bytes (struct-as-map format).
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct TestStruct {
        id: u32,
        name: String,
        active: bool,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = TestStruct {
            id: 42,
            name: "test".to_string(),
            active: true,
        };

        let encoded = MsgPackCodec::encode(&original).unwrap();
        let decoded: TestStruct = MsgPackCodec::decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn test_struct_as_map_format() {
        // Map format starts with 0x8X; array format would start with 0x9X.
        let test = TestStruct {
            id: 1,
            name: "x".to_string(),
            active: false,
        };

        let encoded = MsgPackCodec::encode(&test).unwrap();
        assert_eq!(
            encoded[0] & 0xF0,
            0x80,
            "Expected map format (0x8X), got {:02X}",
            encoded[0]
        );
    }

    #[test]
    fn test_encode_decode_collections() {
        let vec = vec![1, 2, 3, 4, 5];
        let encoded = MsgPackCodec::encode(&vec).unwrap();
        let decoded: Vec<i32> = MsgPackCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, vec);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let invalid = b"not valid msgpack";
        let result: Result<TestStruct> = MsgPackCodec::decode(invalid);
        assert!(result.is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(MsgPackCodec::CONTENT_TYPE, "application/msgpack");
    }
}
