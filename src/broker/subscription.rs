//! Per-connection delivery endpoint bound to a named destination.
//!
//! A subscription enforces three limits on every delivery, all surfaced as
//! immediate `Backpressure` errors rather than blocking:
//! - client-individual mode: one unacknowledged message in flight at a time
//! - pending cap: bounded set of unacknowledged message ids
//! - rate limit: bounded sends per one-second window, for every ack mode
//!   (`auto` included - the observed behavior is preserved deliberately)
//!
//! Delivery crosses connections through an mpsc sender into the owning
//! connection's loop; the mutable pending state sits behind the
//! subscription's own lock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{BackpressureCause, Result, StompwireError};
use crate::protocol::{headers, Frame};

/// Policy governing how delivered messages must be acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// No acknowledgment required; nothing is recorded as pending.
    Auto,
    /// Cumulative acknowledgment: acking an id also acks earlier pending ids.
    Client,
    /// One in-flight message at a time, acked individually.
    ClientIndividual,
}

impl AckMode {
    /// Parse the `ack` header value from SUBSCRIBE.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(Self::Auto),
            "client" => Some(Self::Client),
            "client-individual" => Some(Self::ClientIndividual),
            _ => None,
        }
    }

    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Client => "client",
            Self::ClientIndividual => "client-individual",
        }
    }
}

/// Mutable state guarded by the subscription's lock.
struct DeliveryState {
    /// In-flight message ids awaiting ack, FIFO order.
    pending: VecDeque<String>,
    /// Start of the current one-second rate window.
    window_start: Instant,
    /// Sends accepted within the current window.
    window_count: u32,
}

/// A per-connection delivery endpoint for one destination.
pub struct Subscription {
    /// Client-chosen subscription id.
    id: String,
    /// Destination queue this subscription is bound to.
    destination: String,
    /// Acknowledgment policy.
    ack: AckMode,
    /// Cap on unacknowledged pending message ids.
    pending_cap: usize,
    /// Sends allowed per one-second window.
    max_messages_per_second: u32,
    /// Pending/rate state, exclusively owned behind this lock.
    state: Mutex<DeliveryState>,
    /// Channel into the owning connection's loop.
    delivery: mpsc::Sender<Frame>,
}

impl Subscription {
    /// Create a subscription delivering into `delivery`.
    pub fn new(
        id: impl Into<String>,
        destination: impl Into<String>,
        ack: AckMode,
        pending_cap: usize,
        max_messages_per_second: u32,
        delivery: mpsc::Sender<Frame>,
    ) -> Self {
        Self {
            id: id.into(),
            destination: destination.into(),
            ack,
            pending_cap,
            max_messages_per_second,
            state: Mutex::new(DeliveryState {
                pending: VecDeque::new(),
                window_start: Instant::now(),
                window_count: 0,
            }),
            delivery,
        }
    }

    /// Client-chosen subscription id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Destination queue name.
    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Acknowledgment policy.
    #[inline]
    pub fn ack_mode(&self) -> AckMode {
        self.ack
    }

    /// Deliver a frame to this subscription.
    ///
    /// On success, non-auto modes record the frame's `message-id` as
    /// pending. Fails with `Backpressure` instead of blocking when a limit
    /// is hit; the rate limit applies to every ack mode.
    pub fn send(&self, frame: Frame) -> Result<()> {
        let message_id = frame.header(headers::MESSAGE_ID).map(str::to_string);
        let mut state = self.state.lock();

        if self.ack == AckMode::ClientIndividual && !state.pending.is_empty() {
            return Err(StompwireError::Backpressure(
                BackpressureCause::IndividualAckInFlight,
            ));
        }

        if self.ack != AckMode::Auto && state.pending.len() >= self.pending_cap {
            return Err(StompwireError::Backpressure(
                BackpressureCause::PendingCapReached,
            ));
        }

        let now = Instant::now();
        if now.duration_since(state.window_start) >= Duration::from_secs(1) {
            state.window_start = now;
            state.window_count = 0;
        }
        if state.window_count >= self.max_messages_per_second {
            return Err(StompwireError::Backpressure(
                BackpressureCause::RateLimitExceeded,
            ));
        }

        self.delivery.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                StompwireError::Backpressure(BackpressureCause::DeliveryQueueFull)
            }
            mpsc::error::TrySendError::Closed(_) => StompwireError::ConnectionClosed,
        })?;

        state.window_count += 1;
        if self.ack != AckMode::Auto {
            if let Some(id) = message_id {
                state.pending.push_back(id);
            }
        }
        Ok(())
    }

    /// Cumulative acknowledgment.
    ///
    /// Clears every pending id from the front of the FIFO up to and
    /// including `message_id`; later ids remain pending. An id that is not
    /// pending is a no-op, not an error.
    pub fn ack(&self, message_id: &str) {
        let mut state = self.state.lock();
        if let Some(pos) = state.pending.iter().position(|id| id == message_id) {
            state.pending.drain(..=pos);
        }
    }

    /// Whether `message_id` is awaiting acknowledgment.
    pub fn is_message_pending(&self, message_id: &str) -> bool {
        self.state.lock().pending.iter().any(|id| id == message_id)
    }

    /// Number of unacknowledged pending messages.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }
}
