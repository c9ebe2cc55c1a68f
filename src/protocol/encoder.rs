//! Frame encoder, resumable across partial socket writes.
//!
//! `prepare` serializes a frame into an internal buffer sized to the
//! message. The caller then writes `pending()` to the socket and reports
//! how many bytes the channel accepted via `on_send_completed`, which
//! advances an internal offset and says whether the frame is fully sent.
//! `clear` resets everything, used when aborting or reusing the encoder.
//!
//! # Example
//!
//! ```
//! use stompwire::protocol::{Frame, FrameEncoder};
//!
//! let mut encoder = FrameEncoder::new();
//! encoder.prepare(&Frame::new("DISCONNECT")).unwrap();
//!
//! // Pretend the socket accepted 3 bytes.
//! let done = encoder.on_send_completed(3);
//! assert!(!done);
//! let remaining = encoder.pending().len();
//! assert!(encoder.on_send_completed(remaining));
//! ```

use crate::error::{Result, StompwireError};

use super::wire_format::{encode_header_section, Preamble, PREAMBLE_SIZE};
use super::Frame;

/// Serializes frames and tracks partial-write progress.
///
/// One instance per connection, never shared.
pub struct FrameEncoder {
    /// The fully serialized frame.
    buffer: Vec<u8>,
    /// How many bytes of `buffer` have been written so far.
    offset: usize,
}

impl FrameEncoder {
    /// Create an idle encoder.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            offset: 0,
        }
    }

    /// Serialize `frame` into the internal buffer.
    ///
    /// # Errors
    ///
    /// `Protocol` if a previous frame is still partially sent, or if the
    /// frame's command/header text is not encodable.
    pub fn prepare(&mut self, frame: &Frame) -> Result<()> {
        if !self.is_idle() {
            return Err(StompwireError::Protocol(
                "Previous frame not fully sent".to_string(),
            ));
        }

        let section = encode_header_section(&frame.command, frame.headers())?;
        let preamble = Preamble::new(section.len() as u32, frame.body.len() as u32);

        self.buffer.clear();
        self.buffer
            .reserve(PREAMBLE_SIZE + section.len() + frame.body.len());
        self.buffer.extend_from_slice(&preamble.encode());
        self.buffer.extend_from_slice(&section);
        self.buffer.extend_from_slice(&frame.body);
        self.offset = 0;
        Ok(())
    }

    /// The not-yet-written remainder of the prepared frame.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }

    /// Whether no frame is in flight.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Record that the channel accepted `bytes_written` bytes.
    ///
    /// Returns `true` once the frame is fully sent; the encoder is then
    /// idle and ready for the next `prepare`.
    pub fn on_send_completed(&mut self, bytes_written: usize) -> bool {
        self.offset = (self.offset + bytes_written).min(self.buffer.len());
        if self.is_idle() {
            self.buffer.clear();
            self.offset = 0;
            true
        } else {
            false
        }
    }

    /// Reset all internal state, discarding any partially-sent frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.offset = 0;
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{headers, FrameDecoder};
    use bytes::Bytes;

    #[test]
    fn test_prepare_and_full_send() {
        let mut encoder = FrameEncoder::new();
        let frame = Frame::new("SEND")
            .with_header(headers::DESTINATION, "orders")
            .with_body(Bytes::from_static(b"hello"));

        encoder.prepare(&frame).unwrap();
        let total = encoder.pending().len();
        assert!(total > 0);

        assert!(encoder.on_send_completed(total));
        assert!(encoder.is_idle());
    }

    #[test]
    fn test_partial_sends_resume() {
        let mut encoder = FrameEncoder::new();
        let frame = Frame::new("MESSAGE")
            .with_header(headers::MESSAGE_ID, "m1")
            .with_body(Bytes::from_static(b"0123456789"));

        encoder.prepare(&frame).unwrap();
        let wire = encoder.pending().to_vec();

        // Drain in 3-byte chunks, collecting what "the socket" accepted.
        let mut sent = Vec::new();
        loop {
            let chunk = encoder.pending().iter().take(3).copied().collect::<Vec<_>>();
            sent.extend_from_slice(&chunk);
            if encoder.on_send_completed(chunk.len()) {
                break;
            }
        }

        assert_eq!(sent, wire);

        // The full wire bytes decode back to the same frame.
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&sent).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, "MESSAGE");
        assert_eq!(&frames[0].body[..], b"0123456789");
    }

    #[test]
    fn test_prepare_while_in_flight_rejected() {
        let mut encoder = FrameEncoder::new();
        encoder.prepare(&Frame::new("RECEIPT")).unwrap();
        encoder.on_send_completed(2);

        let result = encoder.prepare(&Frame::new("RECEIPT"));
        assert!(matches!(result, Err(StompwireError::Protocol(_))));
    }

    #[test]
    fn test_prepare_after_completion_succeeds() {
        let mut encoder = FrameEncoder::new();
        encoder.prepare(&Frame::new("RECEIPT")).unwrap();
        let total = encoder.pending().len();
        assert!(encoder.on_send_completed(total));

        assert!(encoder.prepare(&Frame::new("ERROR")).is_ok());
    }

    #[test]
    fn test_clear_aborts_in_flight_frame() {
        let mut encoder = FrameEncoder::new();
        let frame = Frame::new("MESSAGE").with_body(Bytes::from_static(b"abc"));
        encoder.prepare(&frame).unwrap();
        encoder.on_send_completed(1);

        encoder.clear();
        assert!(encoder.is_idle());
        assert!(encoder.prepare(&Frame::new("RECEIPT")).is_ok());
    }

    #[test]
    fn test_prepare_rejects_unencodable_frame() {
        let mut encoder = FrameEncoder::new();
        let frame = Frame::new("SEND").with_header("bad:key", "v");
        assert!(encoder.prepare(&frame).is_err());
        // A failed prepare leaves the encoder idle.
        assert!(encoder.is_idle());
    }

    #[test]
    fn test_zero_byte_send_reports_not_done() {
        let mut encoder = FrameEncoder::new();
        encoder.prepare(&Frame::new("RECEIPT")).unwrap();
        assert!(!encoder.on_send_completed(0));
        assert!(!encoder.is_idle());
    }
}
