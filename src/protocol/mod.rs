//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the binary frame contract:
//! - 8-byte preamble plus text header-section encoding/decoding
//! - [`FrameDecoder`] resumable across partial reads
//! - [`FrameEncoder`] resumable across partial writes
//! - [`Frame`] with ordered headers and typed constructors

mod decoder;
mod encoder;
mod frame;
mod wire_format;

pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;
pub use frame::{headers, Frame};
pub use wire_format::{
    encode_header_section, parse_header_section, Preamble, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_MAX_HEADER_SECTION, PREAMBLE_SIZE,
};
