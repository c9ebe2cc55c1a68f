//! Per-connection serial receive-dispatch-send loop.
//!
//! A channel owns one connection's socket, one decoder, one encoder, and
//! one pooled buffer segment, and drives them serially: decode until a
//! frame is produced, dispatch it to the session, write the responses
//! (resuming partial writes), repeat. Frame N+1 is never decoded before
//! frame N has been fully handled, so per-connection ordering is total.
//!
//! Deliveries published by other connections arrive on the session's
//! delivery queue and are written between inbound frames. Any socket
//! failure exits the loop; the session is then closed exactly once and the
//! segment goes back to the pool.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::broker::{Broker, Session};
use crate::buffer::BufferSegment;
use crate::error::{Result, StompwireError};
use crate::protocol::{Frame, FrameDecoder, FrameEncoder};

/// One connection's transport state and serial loop.
pub struct Channel<S> {
    stream: S,
    decoder: FrameDecoder,
    encoder: FrameEncoder,
    segment: BufferSegment,
    session: Session,
    deliveries: mpsc::Receiver<Frame>,
    broker: Arc<Broker>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Channel<S> {
    /// Wire a fresh session onto a connected stream.
    ///
    /// `segment` is the pooled read buffer checked out at accept; it is
    /// returned to the pool when the channel finishes.
    pub fn new(broker: Arc<Broker>, stream: S, segment: BufferSegment) -> Self {
        let config = broker.config();
        let decoder = FrameDecoder::with_limits(config.max_header_section, config.max_body_size);
        let (session, deliveries) = broker.open_session();
        Self {
            stream,
            decoder,
            encoder: FrameEncoder::new(),
            segment,
            session,
            deliveries,
            broker,
        }
    }

    /// The broker session driven by this channel.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Drive the connection until it closes or fails.
    ///
    /// Always closes the session and returns the buffer segment to the
    /// pool, whatever the outcome. The session's decoder/encoder state is
    /// discarded with the channel, never reused for another connection.
    pub async fn run(mut self) -> Result<()> {
        let result = self.serve().await;
        match &result {
            Ok(()) => tracing::debug!(session = self.session.id(), "connection closed"),
            Err(e) => {
                tracing::warn!(session = self.session.id(), error = %e, "connection failed")
            }
        }
        self.session.close();
        self.broker.pool().release(self.segment);
        result
    }

    async fn serve(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                delivery = self.deliveries.recv() => {
                    match delivery {
                        Some(frame) => self.write_frame(&frame).await?,
                        None => return Ok(()),
                    }
                }
                read = self.stream.read(self.segment.writable()) => {
                    let n = read?;
                    if n == 0 {
                        return Ok(());
                    }
                    self.segment.set_view(0, n)?;
                    let frames = self.decoder.push(self.segment.as_slice())?;

                    for frame in frames {
                        for response in self.session.handle(&frame) {
                            self.write_frame(&response).await?;
                        }
                        if self.session.is_closed() {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Write one frame, resuming across partial writes.
    async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.encoder.prepare(frame)?;
        loop {
            let n = self.stream.write(self.encoder.pending()).await?;
            if n == 0 {
                return Err(StompwireError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write returned 0",
                )));
            }
            if self.encoder.on_send_completed(n) {
                break;
            }
        }
        self.stream.flush().await?;
        Ok(())
    }
}
