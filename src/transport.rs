//! TCP transport - accept loop wiring connections to channels.
//!
//! Each accepted connection checks a buffer segment out of the broker's
//! pool and gets its own [`Channel`] task. When the pool is exhausted the
//! connection is refused immediately - nobody waits for a slice.
//!
//! # Example
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
//!     let listener = BrokerListener::bind(broker).await?;
//!     listener.run().await
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::broker::Broker;
use crate::channel::Channel;
use crate::error::Result;

/// TCP accept loop for a broker.
pub struct BrokerListener {
    listener: TcpListener,
    broker: Arc<Broker>,
}

impl BrokerListener {
    /// Bind to the address from the broker's configuration.
    pub async fn bind(broker: Arc<Broker>) -> Result<Self> {
        let listener = TcpListener::bind(&broker.config().bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "broker listening");
        Ok(Self { listener, broker })
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one connection and spawn its channel task.
    ///
    /// A connection arriving while the pool is exhausted is dropped with a
    /// warning; the accept loop itself keeps running.
    pub async fn accept_one(&self) -> Result<()> {
        let (stream, addr) = self.listener.accept().await?;
        match self.broker.pool().acquire() {
            Ok(segment) => {
                tracing::debug!(%addr, "connection accepted");
                let channel = Channel::new(self.broker.clone(), stream, segment);
                tokio::spawn(async move {
                    // run() logs its own outcome and always releases the segment.
                    let _ = channel.run().await;
                });
            }
            Err(e) => {
                tracing::warn!(%addr, error = %e, "connection refused");
                drop(stream);
            }
        }
        Ok(())
    }

    /// Accept connections until the listener itself fails.
    pub async fn run(self) -> Result<()> {
        loop {
            self.accept_one().await?;
        }
    }
}
