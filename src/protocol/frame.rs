//! Frame struct with typed accessors.
//!
//! A frame is one protocol message: a command, an ordered header map, and
//! an optional body. Headers keep their write order; when a key appears
//! more than once, lookups return the first-written value. Frames are
//! immutable once dispatched.
//!
//! # Example
//!
//! ```
//! use stompwire::protocol::{headers, Frame};
//! use bytes::Bytes;
//!
//! let frame = Frame::new("SEND")
//!     .with_header(headers::DESTINATION, "orders")
//!     .with_body(Bytes::from_static(b"hello"));
//!
//! assert_eq!(frame.command, "SEND");
//! assert_eq!(frame.header(headers::DESTINATION), Some("orders"));
//! assert!(frame.has_body());
//! ```

use bytes::Bytes;

/// Header names the broker logic consumes.
pub mod headers {
    /// Destination queue name on SEND/SUBSCRIBE/MESSAGE.
    pub const DESTINATION: &str = "destination";
    /// Subscription id on SUBSCRIBE/UNSUBSCRIBE.
    pub const ID: &str = "id";
    /// Ack mode on SUBSCRIBE: `auto`, `client`, `client-individual`.
    pub const ACK: &str = "ack";
    /// Transaction id on SEND/BEGIN/COMMIT/ABORT.
    pub const TRANSACTION: &str = "transaction";
    /// Client-requested receipt correlation id.
    pub const RECEIPT: &str = "receipt";
    /// Echo of `receipt` on RECEIPT and ERROR frames.
    pub const RECEIPT_ID: &str = "receipt-id";
    /// Server-assigned message id on MESSAGE; target of ACK/NACK.
    pub const MESSAGE_ID: &str = "message-id";
    /// Subscription the MESSAGE was delivered on; optional on ACK/NACK.
    pub const SUBSCRIPTION: &str = "subscription";
    /// Human-readable error text on ERROR frames.
    pub const MESSAGE: &str = "message";
    /// Payload content type, filled by the codec collaborators.
    pub const CONTENT_TYPE: &str = "content-type";
    /// Informational body length.
    pub const CONTENT_LENGTH: &str = "content-length";
}

/// One protocol message: command + ordered headers + optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame command, e.g. `SEND` or `MESSAGE`.
    pub command: String,
    /// Ordered header map; first-written value wins on lookup.
    headers: Vec<(String, String)>,
    /// Body bytes; empty means the frame has no body.
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame with no headers and no body.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Builder-style header append.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Builder-style body attach.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Append a header, preserving write order.
    pub fn push_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.push((key.into(), value.into()));
    }

    /// Look up a header. The first-written value wins for duplicate keys.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All headers in write order, duplicates included.
    #[inline]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whether the frame carries a body.
    #[inline]
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Build from already-parsed parts. Used by the decoder.
    pub(crate) fn from_parts(
        command: String,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self {
            command,
            headers,
            body,
        }
    }

    /// CONNECTED reply sent once a session is authenticated.
    pub fn connected(session_id: &str) -> Self {
        Frame::new("CONNECTED").with_header("session", session_id)
    }

    /// MESSAGE frame delivering a body to a subscription.
    pub fn message(destination: &str, message_id: &str, body: Bytes) -> Self {
        let frame = Frame::new("MESSAGE")
            .with_header(headers::DESTINATION, destination)
            .with_header(headers::MESSAGE_ID, message_id);
        if body.is_empty() {
            frame
        } else {
            let len = body.len().to_string();
            frame.with_header(headers::CONTENT_LENGTH, len).with_body(body)
        }
    }

    /// RECEIPT frame echoing the client's `receipt` header.
    pub fn receipt(receipt_id: &str) -> Self {
        Frame::new("RECEIPT").with_header(headers::RECEIPT_ID, receipt_id)
    }

    /// ERROR frame carrying a human-readable message and, when the failing
    /// frame requested a receipt, the matching `receipt-id`.
    pub fn server_error(message: &str, receipt_id: Option<&str>) -> Self {
        let mut frame = Frame::new("ERROR").with_header(headers::MESSAGE, message);
        if let Some(id) = receipt_id {
            frame.push_header(headers::RECEIPT_ID, id);
        }
        frame
    }

    /// RECEIPT frame for `source`'s `receipt` header, or `None` when the
    /// header is absent.
    pub fn receipt_if_requested(source: &Frame) -> Option<Frame> {
        source.header(headers::RECEIPT).map(Frame::receipt)
    }
}
