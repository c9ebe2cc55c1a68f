//! Frame decoder, resumable across partial socket reads.
//!
//! Uses `bytes::BytesMut` for buffer management and an explicit state
//! machine for fragmented frames:
//! - `AwaitingHeader`: need the preamble plus the full header section
//! - `AccumulatingBody`: header parsed, need N more body bytes
//!
//! One instance per connection, never shared. State persists across calls:
//! when a read delivers fewer bytes than a section declares, `push` returns
//! an empty vector and the caller reads again before re-invoking.
//!
//! # Example
//!
//! ```
//! use stompwire::protocol::{FrameDecoder, FrameEncoder, Frame};
//!
//! let mut encoder = FrameEncoder::new();
//! encoder.prepare(&Frame::new("DISCONNECT")).unwrap();
//! let wire = encoder.pending().to_vec();
//!
//! let mut decoder = FrameDecoder::new();
//! let frames = decoder.push(&wire).unwrap();
//! assert_eq!(frames[0].command, "DISCONNECT");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{
    parse_header_section, Preamble, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADER_SECTION,
    PREAMBLE_SIZE,
};
use super::Frame;
use crate::error::Result;

/// State machine for frame parsing.
#[derive(Debug)]
enum State {
    /// Waiting for the preamble and the complete header section.
    AwaitingHeader,
    /// Header parsed, accumulating the declared body bytes.
    AccumulatingBody {
        command: String,
        headers: Vec<(String, String)>,
        remaining: u32,
    },
}

/// Accumulates incoming bytes and extracts complete frames.
pub struct FrameDecoder {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum accepted header-section size.
    max_header_section: u32,
    /// Maximum accepted body size.
    max_body_size: u32,
}

impl FrameDecoder {
    /// Create a decoder with default limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_HEADER_SECTION, DEFAULT_MAX_BODY_SIZE)
    }

    /// Create a decoder with custom section limits.
    pub fn with_limits(max_header_section: u32, max_body_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            state: State::AwaitingHeader,
            max_header_section,
            max_body_size,
        }
    }

    /// Append data and extract every complete frame.
    ///
    /// An empty vector means more data is needed; all accumulated state is
    /// retained for the next call.
    ///
    /// # Errors
    ///
    /// Protocol errors on oversized declarations or malformed header text.
    /// The decoder state is unrecoverable after an error; the connection
    /// should be closed.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Try to extract a single frame.
    ///
    /// Returns `Ok(Some(frame))` on a complete frame, `Ok(None)` when more
    /// data is needed, `Err` on a protocol violation.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::AwaitingHeader => {
                let preamble = match Preamble::decode(&self.buffer) {
                    Some(p) => p,
                    None => return Ok(None),
                };
                preamble.validate(self.max_header_section, self.max_body_size)?;

                let header_len = preamble.header_len as usize;
                if self.buffer.len() < PREAMBLE_SIZE + header_len {
                    return Ok(None);
                }

                // Consume preamble and header section together.
                let _ = self.buffer.split_to(PREAMBLE_SIZE);
                let section = self.buffer.split_to(header_len);
                let (command, headers) = parse_header_section(&section)?;

                if preamble.body_len == 0 {
                    return Ok(Some(Frame::from_parts(command, headers, Bytes::new())));
                }

                self.state = State::AccumulatingBody {
                    command,
                    headers,
                    remaining: preamble.body_len,
                };

                // The body may already be buffered.
                self.try_extract_one()
            }

            State::AccumulatingBody { remaining, .. } => {
                let remaining = *remaining as usize;
                if self.buffer.len() < remaining {
                    return Ok(None);
                }

                let body = self.buffer.split_to(remaining).freeze();
                let state = std::mem::replace(&mut self.state, State::AwaitingHeader);
                let State::AccumulatingBody {
                    command, headers, ..
                } = state
                else {
                    unreachable!("matched AccumulatingBody above");
                };

                Ok(Some(Frame::from_parts(command, headers, body)))
            }
        }
    }

    /// Number of buffered, not-yet-consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the decoder holds no partial frame.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && matches!(self.state, State::AwaitingHeader)
    }

    /// Reset all internal state, discarding any partial frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::AwaitingHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::AwaitingHeader => "AwaitingHeader",
            State::AccumulatingBody { .. } => "AccumulatingBody",
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::encode_header_section;
    use crate::protocol::headers;

    /// Helper to build a complete frame as wire bytes.
    fn make_wire(command: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
        let owned: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let section = encode_header_section(command, &owned).unwrap();
        let preamble = Preamble::new(section.len() as u32, body.len() as u32);

        let mut wire = preamble.encode().to_vec();
        wire.extend_from_slice(&section);
        wire.extend_from_slice(body);
        wire
    }

    #[test]
    fn test_single_complete_frame() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("SEND", &[("destination", "orders")], b"hello");

        let frames = decoder.push(&wire).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, "SEND");
        assert_eq!(frames[0].header(headers::DESTINATION), Some("orders"));
        assert_eq!(&frames[0].body[..], b"hello");
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_bodyless_frame() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("DISCONNECT", &[], b"");

        let frames = decoder.push(&wire).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(!frames[0].has_body());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut decoder = FrameDecoder::new();

        let mut combined = make_wire("BEGIN", &[("transaction", "t1")], b"");
        combined.extend(make_wire("SEND", &[("destination", "q")], b"one"));
        combined.extend(make_wire("COMMIT", &[("transaction", "t1")], b""));

        let frames = decoder.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].command, "BEGIN");
        assert_eq!(frames[1].command, "SEND");
        assert_eq!(frames[2].command, "COMMIT");
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_fragmented_header_section() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("SEND", &[("destination", "orders")], b"test");

        // Preamble plus half the header section.
        let frames = decoder.push(&wire[..PREAMBLE_SIZE + 5]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(decoder.state_name(), "AwaitingHeader");

        let frames = decoder.push(&wire[PREAMBLE_SIZE + 5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, "SEND");
    }

    #[test]
    fn test_fragmented_body() {
        let mut decoder = FrameDecoder::new();
        let body = b"a body that arrives in two reads";
        let wire = make_wire("SEND", &[("destination", "q")], body);

        let split = wire.len() - 10;
        let frames = decoder.push(&wire[..split]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(decoder.state_name(), "AccumulatingBody");

        let frames = decoder.push(&wire[split..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].body[..], body);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("SEND", &[("destination", "q")], b"hi");

        let mut all_frames = Vec::new();
        for byte in &wire {
            all_frames.extend(decoder.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].command, "SEND");
        assert_eq!(&all_frames[0].body[..], b"hi");
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut decoder = FrameDecoder::new();

        let first = make_wire("BEGIN", &[("transaction", "t1")], b"");
        let second = make_wire("SEND", &[("destination", "q")], b"x");

        let mut data = first.clone();
        data.extend_from_slice(&second[..6]);

        let frames = decoder.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, "BEGIN");

        let frames = decoder.push(&second[6..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, "SEND");
    }

    #[test]
    fn test_oversized_header_rejected() {
        let mut decoder = FrameDecoder::with_limits(16, DEFAULT_MAX_BODY_SIZE);
        let wire = make_wire("SEND", &[("destination", "a-rather-long-queue-name")], b"");

        let result = decoder.push(&wire);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_body_rejected() {
        let mut decoder = FrameDecoder::with_limits(DEFAULT_MAX_HEADER_SECTION, 4);
        let wire = make_wire("SEND", &[("destination", "q")], b"too big");

        let result = decoder.push(&wire);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_header_text_rejected() {
        let mut decoder = FrameDecoder::new();
        let section = b"SEND\nno-colon";
        let preamble = Preamble::new(section.len() as u32, 0);

        let mut wire = preamble.encode().to_vec();
        wire.extend_from_slice(section);

        assert!(decoder.push(&wire).is_err());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("SEND", &[("destination", "q")], b"body");

        decoder.push(&wire[..wire.len() - 2]).unwrap();
        assert_eq!(decoder.state_name(), "AccumulatingBody");
        assert!(!decoder.is_idle());

        decoder.clear();
        assert_eq!(decoder.state_name(), "AwaitingHeader");
        assert!(decoder.is_idle());

        // A fresh frame decodes normally after clear.
        let frames = decoder.push(&wire).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_duplicate_headers_survive_decode() {
        let mut decoder = FrameDecoder::new();
        let wire = make_wire("SEND", &[("foo", "first"), ("foo", "second")], b"");

        let frames = decoder.push(&wire).unwrap();
        assert_eq!(frames[0].header("foo"), Some("first"));
        assert_eq!(frames[0].headers().len(), 2);
    }
}
