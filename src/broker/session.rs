//! Session-level orchestration of inbound frames.
//!
//! A session moves `Connecting → Connected → Closed`. While connected,
//! each inbound frame is dispatched by its parsed [`Command`]: SEND routes
//! to the destination's subscriptions (or defers into an open transaction),
//! SUBSCRIBE/UNSUBSCRIBE manage this connection's subscriptions, ACK/NACK
//! forward to the owning subscription, BEGIN/COMMIT/ABORT drive the
//! transaction manager. Unknown or malformed frames produce an ERROR frame
//! and leave the connection open.
//!
//! `close` is idempotent: it rolls back this session's open transactions
//! and drops its subscriptions. Pending unacknowledged messages are
//! dropped, not requeued or redelivered.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Result, StompwireError};
use crate::protocol::{headers, Frame};

use super::{AckMode, Broker, Command, Principal, Queue, Subscription, TransactionManager};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for CONNECT.
    Connecting,
    /// Authenticated; frames are dispatched.
    Connected,
    /// Torn down; frames are ignored.
    Closed,
}

/// One connection's broker-side state machine.
pub struct Session {
    /// Shared broker root (queue repository, defaults, authenticator).
    broker: Arc<Broker>,
    /// Server-assigned session id, used in message ids.
    id: u64,
    state: SessionState,
    /// Identity attached after successful CONNECT.
    principal: Option<Principal>,
    /// This session's transactions; cleaned up on close.
    transactions: TransactionManager,
    /// Subscriptions owned by this session, by subscription id.
    subscriptions: HashMap<String, Arc<Subscription>>,
    /// Sender cloned into every subscription this session creates.
    delivery_tx: mpsc::Sender<Frame>,
    /// Message id sequence within this session.
    next_message_seq: u64,
}

impl Session {
    pub(crate) fn new(broker: Arc<Broker>, id: u64, delivery_tx: mpsc::Sender<Frame>) -> Self {
        Self {
            broker,
            id,
            state: SessionState::Connecting,
            principal: None,
            transactions: TransactionManager::new(),
            subscriptions: HashMap::new(),
            delivery_tx,
            next_message_seq: 0,
        }
    }

    /// Server-assigned session id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// The principal attached at CONNECT, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Whether any client transaction is open.
    pub fn has_active_transactions(&self) -> bool {
        self.transactions.has_active_transactions()
    }

    /// Dispatch one inbound frame, returning the response frames to write.
    ///
    /// Every failure that is the client's fault becomes an ERROR frame
    /// (carrying `receipt-id` when the frame requested a receipt); the
    /// connection stays open.
    pub fn handle(&mut self, frame: &Frame) -> Vec<Frame> {
        if self.is_closed() {
            return Vec::new();
        }

        let receipt_id = frame.header(headers::RECEIPT);
        let Some(command) = Command::parse(&frame.command) else {
            tracing::warn!(session = self.id, command = %frame.command, "unknown command");
            return vec![Frame::server_error(
                &format!("unknown command: {}", frame.command),
                receipt_id,
            )];
        };

        if command == Command::Disconnect {
            let responses = Frame::receipt_if_requested(frame).into_iter().collect();
            self.close();
            return responses;
        }

        match self.state {
            SessionState::Connecting => self.handle_connecting(command, frame),
            SessionState::Connected => self.handle_connected(command, frame),
            SessionState::Closed => Vec::new(),
        }
    }

    fn handle_connecting(&mut self, command: Command, frame: &Frame) -> Vec<Frame> {
        let receipt_id = frame.header(headers::RECEIPT);
        if command != Command::Connect {
            return vec![Frame::server_error("not connected", receipt_id)];
        }

        match self.broker.authenticator().authenticate(frame) {
            Ok(principal) => {
                tracing::debug!(
                    session = self.id,
                    principal = %principal.name(),
                    "session connected"
                );
                self.principal = Some(principal);
                self.state = SessionState::Connected;
                vec![Frame::connected(&self.id.to_string())]
            }
            Err(e) => {
                tracing::warn!(session = self.id, error = %e, "authentication refused");
                vec![Frame::server_error(
                    &format!("authentication failed: {}", e),
                    receipt_id,
                )]
            }
        }
    }

    fn handle_connected(&mut self, command: Command, frame: &Frame) -> Vec<Frame> {
        let receipt_id = frame.header(headers::RECEIPT);
        let result = match command {
            Command::Connect => Err(StompwireError::Protocol(
                "already connected".to_string(),
            )),
            Command::Send => self.on_send(frame),
            Command::Subscribe => self.on_subscribe(frame),
            Command::Unsubscribe => self.on_unsubscribe(frame),
            // NACK drops the pending entry exactly like ACK: redelivery
            // is out of scope at this layer.
            Command::Ack | Command::Nack => self.on_ack(frame),
            Command::Begin => self.on_begin(frame),
            Command::Commit => self.on_commit(frame),
            Command::Abort => self.on_abort(frame),
            Command::Disconnect => unreachable!("handled before state dispatch"),
        };

        match result {
            Ok(()) => Frame::receipt_if_requested(frame).into_iter().collect(),
            Err(e) => {
                tracing::debug!(session = self.id, command = ?command, error = %e, "frame refused");
                vec![Frame::server_error(&e.to_string(), receipt_id)]
            }
        }
    }

    fn on_send(&mut self, frame: &Frame) -> Result<()> {
        let destination = frame.header(headers::DESTINATION).ok_or_else(|| {
            StompwireError::InvalidArgument("SEND requires a destination header".to_string())
        })?;
        let queue = self.broker.queues().get(destination)?;

        self.next_message_seq += 1;
        let message_id = format!("msg-{}-{}", self.id, self.next_message_seq);

        let mut message = Frame::message(destination, &message_id, frame.body.clone());
        if let Some(content_type) = frame.header(headers::CONTENT_TYPE) {
            message.push_header(headers::CONTENT_TYPE, content_type);
        }

        match frame.header(headers::TRANSACTION) {
            Some(transaction) => {
                let commit_queue = queue.clone();
                let discarded_id = message_id.clone();
                self.transactions.enqueue(
                    transaction,
                    Box::new(move || Self::deliver(&commit_queue, &message)),
                    Box::new(move || {
                        tracing::debug!(message_id = %discarded_id, "transactional send discarded");
                    }),
                )?;
            }
            None => Self::deliver(&queue, &message),
        }
        Ok(())
    }

    /// Fan a MESSAGE out to the queue's subscriptions. Per-subscription
    /// backpressure failures are surfaced here and logged; they never stop
    /// delivery to the remaining subscriptions.
    fn deliver(queue: &Queue, message: &Frame) {
        for (subscription, error) in queue.deliver(message) {
            tracing::warn!(
                queue = %queue.name(),
                subscription = %subscription,
                error = %error,
                "delivery rejected"
            );
        }
    }

    fn on_subscribe(&mut self, frame: &Frame) -> Result<()> {
        let destination = frame.header(headers::DESTINATION).ok_or_else(|| {
            StompwireError::InvalidArgument("SUBSCRIBE requires a destination header".to_string())
        })?;
        let id = frame.header(headers::ID).ok_or_else(|| {
            StompwireError::InvalidArgument("SUBSCRIBE requires an id header".to_string())
        })?;
        if self.subscriptions.contains_key(id) {
            return Err(StompwireError::InvalidArgument(format!(
                "subscription id already in use: {}",
                id
            )));
        }

        let ack = match frame.header(headers::ACK) {
            None => AckMode::Auto,
            Some(value) => AckMode::parse(value).ok_or_else(|| {
                StompwireError::InvalidArgument(format!("invalid ack mode: {}", value))
            })?,
        };

        let queue = self.broker.queues().get(destination)?;
        let config = self.broker.config();
        let subscription = Arc::new(Subscription::new(
            id,
            destination,
            ack,
            config.pending_cap,
            config.max_messages_per_second,
            self.delivery_tx.clone(),
        ));

        queue.add_subscription(subscription.clone());
        self.subscriptions.insert(id.to_string(), subscription);
        Ok(())
    }

    fn on_unsubscribe(&mut self, frame: &Frame) -> Result<()> {
        let id = frame.header(headers::ID).ok_or_else(|| {
            StompwireError::InvalidArgument("UNSUBSCRIBE requires an id header".to_string())
        })?;
        let subscription = self.subscriptions.remove(id).ok_or_else(|| {
            StompwireError::InvalidArgument(format!("unknown subscription id: {}", id))
        })?;

        // Pending unacknowledged messages are dropped with the subscription.
        if let Ok(queue) = self.broker.queues().get(subscription.destination()) {
            queue.remove_subscription(id);
        }
        Ok(())
    }

    fn on_ack(&mut self, frame: &Frame) -> Result<()> {
        let message_id = frame.header(headers::MESSAGE_ID).ok_or_else(|| {
            StompwireError::InvalidArgument("ACK requires a message-id header".to_string())
        })?;

        match frame.header(headers::SUBSCRIPTION) {
            Some(id) => {
                let subscription = self.subscriptions.get(id).ok_or_else(|| {
                    StompwireError::InvalidArgument(format!("unknown subscription id: {}", id))
                })?;
                subscription.ack(message_id);
            }
            None => {
                // Without a subscription header, find the owner. An id that
                // is pending nowhere is a no-op.
                for subscription in self.subscriptions.values() {
                    if subscription.is_message_pending(message_id) {
                        subscription.ack(message_id);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn on_begin(&mut self, frame: &Frame) -> Result<()> {
        self.transactions.begin(Self::transaction_id(frame)?)
    }

    fn on_commit(&mut self, frame: &Frame) -> Result<()> {
        self.transactions.commit(Self::transaction_id(frame)?)
    }

    fn on_abort(&mut self, frame: &Frame) -> Result<()> {
        self.transactions.rollback(Self::transaction_id(frame)?)
    }

    fn transaction_id(frame: &Frame) -> Result<&str> {
        frame.header(headers::TRANSACTION).ok_or_else(|| {
            StompwireError::InvalidArgument(format!(
                "{} requires a transaction header",
                frame.command
            ))
        })
    }

    /// Tear the session down. Idempotent; runs cleanup exactly once.
    ///
    /// Rolls back this session's open transactions and releases its
    /// subscriptions without redelivering their pending messages.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = SessionState::Closed;
        self.transactions.cleanup();

        for (id, subscription) in self.subscriptions.drain() {
            if let Ok(queue) = self.broker.queues().get(subscription.destination()) {
                queue.remove_subscription(&id);
            }
        }
        tracing::debug!(session = self.id, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
