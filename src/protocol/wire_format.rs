//! Wire format encoding and decoding.
//!
//! Every frame starts with an 8-byte preamble:
//! ```text
//! ┌─────────────┬─────────────┬────────────────┬───────────┐
//! │ Header len  │ Body len    │ Header section │ Body      │
//! │ 4 bytes     │ 4 bytes     │ headerLen bytes│ bodyLen   │
//! │ uint32 BE   │ uint32 BE   │ UTF-8 text     │ raw bytes │
//! └─────────────┴─────────────┴────────────────┴───────────┘
//! ```
//!
//! The header section is the command line followed by `key:value` lines,
//! separated by `\n`. A body length of zero means the frame has no body.
//! Decoder and encoder agree on this layout exactly.

use crate::error::{Result, StompwireError};

/// Preamble size in bytes (fixed, exactly 8).
pub const PREAMBLE_SIZE: usize = 8;

/// Default maximum header-section size (8 KB).
pub const DEFAULT_MAX_HEADER_SECTION: u32 = 8 * 1024;

/// Default maximum body size (16 MB).
pub const DEFAULT_MAX_BODY_SIZE: u32 = 16 * 1024 * 1024;

/// Decoded preamble from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    /// Header-section length in bytes.
    pub header_len: u32,
    /// Body length in bytes (0 = no body).
    pub body_len: u32,
}

impl Preamble {
    /// Create a new preamble.
    pub fn new(header_len: u32, body_len: u32) -> Self {
        Self {
            header_len,
            body_len,
        }
    }

    /// Encode the preamble to bytes (Big Endian).
    pub fn encode(&self) -> [u8; PREAMBLE_SIZE] {
        let mut buf = [0u8; PREAMBLE_SIZE];
        buf[0..4].copy_from_slice(&self.header_len.to_be_bytes());
        buf[4..8].copy_from_slice(&self.body_len.to_be_bytes());
        buf
    }

    /// Decode a preamble from bytes (Big Endian).
    ///
    /// Returns `None` if the buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < PREAMBLE_SIZE {
            return None;
        }
        Some(Self {
            header_len: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            body_len: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Validate declared lengths against the configured limits.
    pub fn validate(&self, max_header_section: u32, max_body_size: u32) -> Result<()> {
        if self.header_len == 0 {
            return Err(StompwireError::Protocol(
                "Header section cannot be empty".to_string(),
            ));
        }
        if self.header_len > max_header_section {
            return Err(StompwireError::Protocol(format!(
                "Header section {} exceeds maximum {}",
                self.header_len, max_header_section
            )));
        }
        if self.body_len > max_body_size {
            return Err(StompwireError::Protocol(format!(
                "Body size {} exceeds maximum {}",
                self.body_len, max_body_size
            )));
        }
        Ok(())
    }
}

/// Encode a command and ordered headers into header-section text.
///
/// Keys must not contain `:` or `\n`; values must not contain `\n`.
/// Duplicate keys are written in order.
pub fn encode_header_section(command: &str, headers: &[(String, String)]) -> Result<Vec<u8>> {
    if command.is_empty() || command.contains('\n') {
        return Err(StompwireError::Protocol(format!(
            "Invalid command: {:?}",
            command
        )));
    }

    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(command.as_bytes());

    for (key, value) in headers {
        if key.is_empty() || key.contains(':') || key.contains('\n') {
            return Err(StompwireError::Protocol(format!(
                "Invalid header key: {:?}",
                key
            )));
        }
        if value.contains('\n') {
            return Err(StompwireError::Protocol(format!(
                "Invalid header value for {:?}",
                key
            )));
        }
        out.push(b'\n');
        out.extend_from_slice(key.as_bytes());
        out.push(b':');
        out.extend_from_slice(value.as_bytes());
    }

    Ok(out)
}

/// Parse header-section text into a command and ordered headers.
///
/// The inverse of [`encode_header_section`]. Duplicate keys are preserved
/// in wire order.
pub fn parse_header_section(section: &[u8]) -> Result<(String, Vec<(String, String)>)> {
    let text = std::str::from_utf8(section)
        .map_err(|_| StompwireError::Protocol("Header section is not valid UTF-8".to_string()))?;

    let mut lines = text.split('\n');
    let command = lines
        .next()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| StompwireError::Protocol("Missing command line".to_string()))?
        .to_string();

    let mut headers = Vec::new();
    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| StompwireError::Protocol(format!("Malformed header line: {:?}", line)))?;
        if key.is_empty() {
            return Err(StompwireError::Protocol("Empty header key".to_string()));
        }
        headers.push((key.to_string(), value.to_string()));
    }

    Ok((command, headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_encode_decode_roundtrip() {
        let original = Preamble::new(42, 1000);
        let encoded = original.encode();
        let decoded = Preamble::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_preamble_big_endian_byte_order() {
        let preamble = Preamble::new(0x01020304, 0x05060708);
        let bytes = preamble.encode();

        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[4..8], &[0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn test_preamble_size_is_exactly_8() {
        assert_eq!(PREAMBLE_SIZE, 8);
        assert_eq!(Preamble::new(1, 0).encode().len(), 8);
    }

    #[test]
    fn test_decode_too_short_buffer() {
        let buf = [0u8; 7];
        assert!(Preamble::decode(&buf).is_none());
    }

    #[test]
    fn test_validate_empty_header_rejected() {
        let preamble = Preamble::new(0, 0);
        let result = preamble.validate(DEFAULT_MAX_HEADER_SECTION, DEFAULT_MAX_BODY_SIZE);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_header_too_large() {
        let preamble = Preamble::new(1000, 0);
        let result = preamble.validate(100, DEFAULT_MAX_BODY_SIZE);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_body_too_large() {
        let preamble = Preamble::new(10, 1_000_000);
        let result = preamble.validate(DEFAULT_MAX_HEADER_SECTION, 100);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_header_section_roundtrip() {
        let headers = vec![
            ("destination".to_string(), "orders".to_string()),
            ("receipt".to_string(), "1".to_string()),
        ];
        let encoded = encode_header_section("SEND", &headers).unwrap();
        let (command, parsed) = parse_header_section(&encoded).unwrap();

        assert_eq!(command, "SEND");
        assert_eq!(parsed, headers);
    }

    #[test]
    fn test_header_section_command_only() {
        let encoded = encode_header_section("DISCONNECT", &[]).unwrap();
        let (command, headers) = parse_header_section(&encoded).unwrap();
        assert_eq!(command, "DISCONNECT");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_header_value_may_contain_colon() {
        let headers = vec![("message".to_string(), "bad id: t1".to_string())];
        let encoded = encode_header_section("ERROR", &headers).unwrap();
        let (_, parsed) = parse_header_section(&encoded).unwrap();
        assert_eq!(parsed[0].1, "bad id: t1");
    }

    #[test]
    fn test_duplicate_keys_preserved_in_order() {
        let headers = vec![
            ("foo".to_string(), "first".to_string()),
            ("foo".to_string(), "second".to_string()),
        ];
        let encoded = encode_header_section("SEND", &headers).unwrap();
        let (_, parsed) = parse_header_section(&encoded).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].1, "first");
        assert_eq!(parsed[1].1, "second");
    }

    #[test]
    fn test_encode_rejects_bad_command() {
        assert!(encode_header_section("", &[]).is_err());
        assert!(encode_header_section("SE\nND", &[]).is_err());
    }

    #[test]
    fn test_encode_rejects_bad_keys_and_values() {
        let colon_key = vec![("a:b".to_string(), "v".to_string())];
        assert!(encode_header_section("SEND", &colon_key).is_err());

        let newline_value = vec![("a".to_string(), "v\nw".to_string())];
        assert!(encode_header_section("SEND", &newline_value).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let result = parse_header_section(b"SEND\nno-colon-here");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let result = parse_header_section(&[0x53, 0xFF, 0xFE]);
        assert!(result.is_err());
    }
}
