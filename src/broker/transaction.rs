//! Client-declared transactions over deferred side effects.
//!
//! A transaction groups `(commit, rollback)` action pairs under a
//! client-chosen id. COMMIT runs every commit action in enqueue order;
//! ABORT runs the rollbacks instead. Either way the id is released for
//! reuse. `cleanup` force-rolls-back everything still open, used on
//! disconnect and shutdown.
//!
//! The manager is internally synchronized; actions always run after the
//! lock is released so a commit action may touch other broker state.

use parking_lot::Mutex;

use crate::error::{Result, StompwireError};

/// A deferred side effect.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// One open transaction: id plus its ordered action pairs.
struct Transaction {
    id: String,
    actions: Vec<(Action, Action)>,
}

/// Groups deferred commit/rollback actions under client-chosen ids.
pub struct TransactionManager {
    /// Open transactions in begin order.
    active: Mutex<Vec<Transaction>>,
}

impl TransactionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            active: Mutex::new(Vec::new()),
        }
    }

    /// Open a transaction.
    ///
    /// # Errors
    ///
    /// `TransactionAlreadyActive` if `id` is currently open.
    pub fn begin(&self, id: &str) -> Result<()> {
        let mut active = self.active.lock();
        if active.iter().any(|t| t.id == id) {
            return Err(StompwireError::TransactionAlreadyActive(id.to_string()));
        }
        active.push(Transaction {
            id: id.to_string(),
            actions: Vec::new(),
        });
        Ok(())
    }

    /// Defer a `(commit, rollback)` pair under an open transaction.
    ///
    /// # Errors
    ///
    /// `UnknownTransaction` if `id` is not open.
    pub fn enqueue(&self, id: &str, commit: Action, rollback: Action) -> Result<()> {
        let mut active = self.active.lock();
        let transaction = active
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StompwireError::UnknownTransaction(id.to_string()))?;
        transaction.actions.push((commit, rollback));
        Ok(())
    }

    /// Close the transaction and run its commit actions in enqueue order.
    ///
    /// The id is free for reuse as soon as this returns.
    pub fn commit(&self, id: &str) -> Result<()> {
        let transaction = self.take(id)?;
        for (commit, _rollback) in transaction.actions {
            commit();
        }
        Ok(())
    }

    /// Close the transaction and run its rollback actions in enqueue order.
    pub fn rollback(&self, id: &str) -> Result<()> {
        let transaction = self.take(id)?;
        for (_commit, rollback) in transaction.actions {
            rollback();
        }
        Ok(())
    }

    /// Roll back every open transaction, in begin order.
    ///
    /// Used on disconnect/shutdown; the only bulk operation.
    pub fn cleanup(&self) {
        let drained: Vec<Transaction> = self.active.lock().drain(..).collect();
        for transaction in drained {
            tracing::debug!(transaction = %transaction.id, "rolling back on cleanup");
            for (_commit, rollback) in transaction.actions {
                rollback();
            }
        }
    }

    /// Whether any transaction is open.
    pub fn has_active_transactions(&self) -> bool {
        !self.active.lock().is_empty()
    }

    /// Remove the transaction from the active set, releasing the lock
    /// before any action runs.
    fn take(&self, id: &str) -> Result<Transaction> {
        let mut active = self.active.lock();
        let pos = active
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StompwireError::UnknownTransaction(id.to_string()))?;
        Ok(active.remove(pos))
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.active.lock();
        f.debug_struct("TransactionManager")
            .field("active", &active.iter().map(|t| &t.id).collect::<Vec<_>>())
            .finish()
    }
}
