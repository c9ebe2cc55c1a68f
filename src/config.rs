//! Broker configuration.
//!
//! All tunables the startup layer supplies: buffer pool geometry,
//! per-subscription limits, codec size limits, and the bind address.

use crate::protocol::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADER_SECTION};

/// Default size of one pooled buffer slice (64 KB).
pub const DEFAULT_SLICE_SIZE: usize = 64 * 1024;

/// Default number of slices in the pool (one per concurrent connection).
pub const DEFAULT_SLICE_COUNT: usize = 64;

/// Default cap on unacknowledged pending messages per subscription.
pub const DEFAULT_PENDING_CAP: usize = 20;

/// Default per-subscription send limit per one-second window.
pub const DEFAULT_MAX_MESSAGES_PER_SECOND: u32 = 100;

/// Default capacity of a connection's outbound delivery queue.
pub const DEFAULT_DELIVERY_QUEUE_CAPACITY: usize = 64;

/// Configuration for a [`Broker`](crate::broker::Broker).
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Size in bytes of each pooled buffer slice.
    pub slice_size: usize,
    /// Number of slices the pool hands out before reporting exhaustion.
    pub slice_count: usize,
    /// Cap on unacknowledged pending messages per subscription.
    pub pending_cap: usize,
    /// Per-subscription send limit per one-second window.
    pub max_messages_per_second: u32,
    /// Capacity of each connection's outbound delivery queue.
    pub delivery_queue_capacity: usize,
    /// Maximum accepted header-section size in bytes.
    pub max_header_section: u32,
    /// Maximum accepted body size in bytes.
    pub max_body_size: u32,
    /// Address the transport listener binds to.
    pub bind_addr: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            slice_size: DEFAULT_SLICE_SIZE,
            slice_count: DEFAULT_SLICE_COUNT,
            pending_cap: DEFAULT_PENDING_CAP,
            max_messages_per_second: DEFAULT_MAX_MESSAGES_PER_SECOND,
            delivery_queue_capacity: DEFAULT_DELIVERY_QUEUE_CAPACITY,
            max_header_section: DEFAULT_MAX_HEADER_SECTION,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            bind_addr: "127.0.0.1:61613".to_string(),
        }
    }
}
