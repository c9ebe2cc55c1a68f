//! Codec module - serialization/deserialization for frame bodies.
//!
//! The framing layer never interprets payloads itself; these collaborators
//! turn application values into `(content-type, bytes)` pairs and back:
//!
//! - [`MsgPackCodec`] - MessagePack via `rmp-serde` (`to_vec_named`)
//! - [`JsonCodec`] - JSON via `serde_json`
//! - [`RawCodec`] - pass-through for already-serialized octets
//!
//! Codecs are marker structs with static methods rather than trait
//! objects, so codec selection is a compile-time choice and zero-copy
//! paths stay available. Each codec exposes a `CONTENT_TYPE` constant that
//! fills the frame's `content-type` header.
//!
//! # Example
//!
//! ```
//! use stompwire::codec::{JsonCodec, MsgPackCodec};
//!
//! let encoded = MsgPackCodec::encode(&"hello").unwrap();
//! let decoded: String = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let encoded = JsonCodec::encode(&42u32).unwrap();
//! let decoded: u32 = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, 42);
//! ```

mod json;
mod msgpack;
mod raw;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use raw::RawCodec;
