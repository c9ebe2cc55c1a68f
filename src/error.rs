//! Error types for stompwire.

use thiserror::Error;

/// Main error type for all stompwire operations.
#[derive(Debug, Error)]
pub enum StompwireError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON payload serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack payload serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack payload deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Protocol error (malformed frame, oversized section, bad header text).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The buffer pool has no free slices.
    #[error("Buffer pool exhausted")]
    PoolExhausted,

    /// A delivery was rejected so the caller slows down instead of blocking.
    #[error("Backpressure: {0}")]
    Backpressure(BackpressureCause),

    /// BEGIN with a transaction id that is already open.
    #[error("Transaction already active: {0}")]
    TransactionAlreadyActive(String),

    /// COMMIT/ABORT/enqueue referencing a transaction id that is not open.
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    /// SEND/SUBSCRIBE referencing a destination that was never registered.
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// Empty name, missing required header, or similar caller mistake.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Why a subscription refused a delivery.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureCause {
    /// client-individual mode allows exactly one unacknowledged message.
    #[error("one unacknowledged message already in flight")]
    IndividualAckInFlight,

    /// The pending unacknowledged set is at its cap.
    #[error("pending message cap reached")]
    PendingCapReached,

    /// The per-second send counter hit its limit for the current window.
    #[error("per-second message rate exceeded")]
    RateLimitExceeded,

    /// The owning connection's delivery queue is full.
    #[error("delivery queue full")]
    DeliveryQueueFull,
}

/// Result type alias using StompwireError.
pub type Result<T> = std::result::Result<T, StompwireError>;
