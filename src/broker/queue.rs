//! Named destinations and their registry.
//!
//! A queue is a named destination holding the live subscriptions bound to
//! it. The repository maps names to queues; queues are created by the
//! configuration/administration layer and looked up per SEND/SUBSCRIBE.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, StompwireError};
use crate::protocol::Frame;

use super::Subscription;

/// A named destination.
pub struct Queue {
    /// Unique key within the repository.
    name: String,
    /// Live subscriptions, mutated on subscribe/unsubscribe paths.
    subscriptions: Mutex<Vec<Arc<Subscription>>>,
}

impl Queue {
    /// Create an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// The queue's unique name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a subscription.
    pub fn add_subscription(&self, subscription: Arc<Subscription>) {
        self.subscriptions.lock().push(subscription);
    }

    /// Remove the subscription with the given id, dropping its pending
    /// messages. Unknown ids are a no-op.
    pub fn remove_subscription(&self, id: &str) {
        self.subscriptions.lock().retain(|s| s.id() != id);
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Snapshot of the live subscriptions.
    pub fn subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.subscriptions.lock().clone()
    }

    /// Deliver `frame` to every subscription.
    ///
    /// Returns the per-subscription failures; an empty vector means every
    /// delivery was accepted. Failures are typed, never swallowed - the
    /// caller decides whether to log or surface them.
    pub fn deliver(&self, frame: &Frame) -> Vec<(String, StompwireError)> {
        let snapshot = self.subscriptions();
        let mut failures = Vec::new();
        for subscription in snapshot {
            if let Err(e) = subscription.send(frame.clone()) {
                failures.push((subscription.id().to_string(), e));
            }
        }
        failures
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// Registry of named destinations.
#[derive(Default)]
pub struct QueueRepository {
    queues: RwLock<HashMap<String, Arc<Queue>>>,
}

impl QueueRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queue under its name. The last registration wins.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the queue has no name.
    pub fn add(&self, queue: Arc<Queue>) -> Result<()> {
        if queue.name().is_empty() {
            return Err(StompwireError::InvalidArgument(
                "queue name cannot be empty".to_string(),
            ));
        }
        self.queues
            .write()
            .insert(queue.name().to_string(), queue);
        Ok(())
    }

    /// Look up a queue by name.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name, `QueueNotFound` when nothing is
    /// registered under it.
    pub fn get(&self, name: &str) -> Result<Arc<Queue>> {
        if name.is_empty() {
            return Err(StompwireError::InvalidArgument(
                "queue name cannot be empty".to_string(),
            ));
        }
        self.queues
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StompwireError::QueueNotFound(name.to_string()))
    }

    /// Number of registered queues.
    pub fn len(&self) -> usize {
        self.queues.read().len()
    }

    /// Whether no queue is registered.
    pub fn is_empty(&self) -> bool {
        self.queues.read().is_empty()
    }
}

impl std::fmt::Debug for QueueRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRepository")
            .field("queues", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::AckMode;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    fn test_subscription(id: &str) -> (Arc<Subscription>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(16);
        let sub = Arc::new(Subscription::new(id, "orders", AckMode::Auto, 20, 100, tx));
        (sub, rx)
    }

    #[test]
    fn test_add_empty_name_rejected() {
        let repo = QueueRepository::new();
        let result = repo.add(Arc::new(Queue::new("")));
        assert!(matches!(result, Err(StompwireError::InvalidArgument(_))));
    }

    #[test]
    fn test_get_unregistered_name() {
        let repo = QueueRepository::new();
        let result = repo.get("nope");
        assert!(matches!(
            result,
            Err(StompwireError::QueueNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_get_empty_name_rejected() {
        let repo = QueueRepository::new();
        let result = repo.get("");
        assert!(matches!(result, Err(StompwireError::InvalidArgument(_))));
    }

    #[test]
    fn test_get_returns_registered_instance() {
        let repo = QueueRepository::new();
        let queue = Arc::new(Queue::new("orders"));
        repo.add(queue.clone()).unwrap();

        let fetched = repo.get("orders").unwrap();
        assert!(Arc::ptr_eq(&queue, &fetched));
    }

    #[test]
    fn test_last_registration_wins() {
        let repo = QueueRepository::new();
        let first = Arc::new(Queue::new("orders"));
        let second = Arc::new(Queue::new("orders"));

        repo.add(first.clone()).unwrap();
        repo.add(second.clone()).unwrap();

        let fetched = repo.get("orders").unwrap();
        assert!(Arc::ptr_eq(&second, &fetched));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_queue_add_remove_subscription() {
        let queue = Queue::new("orders");
        let (sub, _rx) = test_subscription("s1");

        queue.add_subscription(sub);
        assert_eq!(queue.subscription_count(), 1);

        queue.remove_subscription("s1");
        assert_eq!(queue.subscription_count(), 0);

        // Removing again is a no-op.
        queue.remove_subscription("s1");
    }

    #[test]
    fn test_deliver_reaches_every_subscription() {
        let queue = Queue::new("orders");
        let (sub1, mut rx1) = test_subscription("s1");
        let (sub2, mut rx2) = test_subscription("s2");
        queue.add_subscription(sub1);
        queue.add_subscription(sub2);

        let frame = Frame::message("orders", "m1", Bytes::from_static(b"x"));
        let failures = queue.deliver(&frame);

        assert!(failures.is_empty());
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_deliver_reports_per_subscription_failures() {
        let queue = Queue::new("orders");

        // One healthy subscription, one whose connection is gone.
        let (healthy, mut rx) = test_subscription("s1");
        let (tx, closed_rx) = mpsc::channel(1);
        drop(closed_rx);
        let dead = Arc::new(Subscription::new("s2", "orders", AckMode::Auto, 20, 100, tx));

        queue.add_subscription(healthy);
        queue.add_subscription(dead);

        let frame = Frame::message("orders", "m1", Bytes::from_static(b"x"));
        let failures = queue.deliver(&frame);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "s2");
        assert!(rx.try_recv().is_ok());
    }
}
