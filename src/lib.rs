//! # stompwire
//!
//! Binary message-framing transport with a STOMP-style broker session layer.
//!
//! ## Architecture
//!
//! - **Framing** (`protocol`): length-delimited frames, resumable across
//!   partial socket reads and writes
//! - **Broker** (`broker`): subscriptions with ack modes and backpressure,
//!   client-declared transactions, named destination queues
//! - **Transport** (`transport` + `channel`): one serial
//!   receive-dispatch-send loop per connection over pooled buffers
//!
//! ## Example
//!
//! ```ignore
//! use stompwire::broker::Broker;
//! use stompwire::config::BrokerConfig;
//! use stompwire::transport::BrokerListener;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> stompwire::Result<()> {
//!     let broker = Arc::new(Broker::new(BrokerConfig::default()));
//!     broker.add_queue("orders")?;
//!
//!     BrokerListener::bind(broker).await?.run().await
//! }
//! ```

pub mod broker;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod channel;

pub use broker::Broker;
pub use channel::Channel;
pub use config::BrokerConfig;
pub use error::{BackpressureCause, Result, StompwireError};
pub use protocol::Frame;
