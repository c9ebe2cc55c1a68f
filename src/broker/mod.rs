//! Broker module - session layer over the framing transport.
//!
//! Provides:
//! - [`Broker`] - the root object owning the queue repository, buffer pool,
//!   authenticator, and defaults; constructed once and shared via `Arc`
//! - [`Session`] - per-connection `Connecting → Connected → Closed` state
//! - [`Subscription`], [`TransactionManager`], [`Queue`], [`QueueRepository`]
//! - [`Command`] - the explicit dispatch table for inbound frame commands
//!
//! # Example
//!
//! ```
//! use stompwire::broker::Broker;
//! use stompwire::config::BrokerConfig;
//! use stompwire::protocol::Frame;
//! use std::sync::Arc;
//!
//! let broker = Arc::new(Broker::new(BrokerConfig::default()));
//! broker.add_queue("orders").unwrap();
//!
//! let (mut session, _deliveries) = broker.open_session();
//! let responses = session.handle(&Frame::new("CONNECT"));
//! assert_eq!(responses[0].command, "CONNECTED");
//! ```

mod auth;
mod queue;
mod session;
mod subscription;
mod transaction;

pub use auth::{AnonymousAuthenticator, Authenticator, Principal};
pub use queue::{Queue, QueueRepository};
pub use session::{Session, SessionState};
pub use subscription::{AckMode, Subscription};
pub use transaction::{Action, TransactionManager};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::buffer::BufferPool;
use crate::config::BrokerConfig;
use crate::error::Result;
use crate::protocol::Frame;

/// Inbound frame commands the session layer dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,
}

impl Command {
    /// Parse a frame's command line. Unknown commands return `None` and
    /// become ERROR frames at the session layer.
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "CONNECT" => Some(Self::Connect),
            "SEND" => Some(Self::Send),
            "SUBSCRIBE" => Some(Self::Subscribe),
            "UNSUBSCRIBE" => Some(Self::Unsubscribe),
            "ACK" => Some(Self::Ack),
            "NACK" => Some(Self::Nack),
            "BEGIN" => Some(Self::Begin),
            "COMMIT" => Some(Self::Commit),
            "ABORT" => Some(Self::Abort),
            "DISCONNECT" => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Disconnect => "DISCONNECT",
        }
    }
}

/// The broker root: queue repository, buffer pool, authenticator, and
/// per-subscription defaults. Constructed once at startup and passed by
/// reference into every connection handler; there are no module-level
/// singletons.
pub struct Broker {
    config: BrokerConfig,
    pool: BufferPool,
    queues: QueueRepository,
    authenticator: Box<dyn Authenticator>,
    next_session_id: AtomicU64,
}

impl Broker {
    /// Create a broker that accepts every connection anonymously.
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_authenticator(config, Box::new(AnonymousAuthenticator))
    }

    /// Create a broker with an authentication collaborator.
    pub fn with_authenticator(config: BrokerConfig, authenticator: Box<dyn Authenticator>) -> Self {
        let pool = BufferPool::new(config.slice_size, config.slice_count);
        Self {
            config,
            pool,
            queues: QueueRepository::new(),
            authenticator,
            next_session_id: AtomicU64::new(0),
        }
    }

    /// Register a destination queue. The last registration wins.
    pub fn add_queue(&self, name: &str) -> Result<()> {
        self.queues.add(Arc::new(Queue::new(name)))
    }

    /// The destination registry.
    #[inline]
    pub fn queues(&self) -> &QueueRepository {
        &self.queues
    }

    /// The connection buffer pool.
    #[inline]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// The broker configuration.
    #[inline]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// The authentication collaborator.
    #[inline]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Open a broker session for one connection.
    ///
    /// Returns the session and the receiver end of its delivery queue;
    /// MESSAGE frames from any connection's publishes arrive there.
    pub fn open_session(self: &Arc<Self>) -> (Session, mpsc::Receiver<Frame>) {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(self.config.delivery_queue_capacity);
        (Session::new(self.clone(), id, tx), rx)
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("queues", &self.queues.len())
            .field("pool_available", &self.pool.available())
            .finish()
    }
}
