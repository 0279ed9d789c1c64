//! Inline callback registries
//!
//! Callbacks run synchronously on the task that triggers them, in
//! registration order. The registration list is snapshotted before each
//! trigger, so a callback may register or unregister others (or itself)
//! without deadlocking. A callback that blocks stalls whoever triggered it,
//! and a panicking callback unwinds into the caller; keeping callbacks short
//! and non-panicking is the subscriber's job.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};
use uuid::Uuid;

/// Type for callback IDs
pub type CallbackId = Uuid;

type Callback<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

/// Ordered list of callbacks for one kind of notification
pub struct CallbackRegistry<T> {
    /// Name used in log lines
    group: String,
    callbacks: RwLock<Vec<(CallbackId, Callback<T>)>>,
}

impl<T> CallbackRegistry<T> {
    /// Create a new callback registry with a group identifier
    pub fn with_group(group: &str) -> Self {
        Self {
            group: group.to_string(),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Register a callback function
    pub fn register<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));

        debug!(callback_id = %id, group = %self.group, "Registered callback");
        id
    }

    /// Unregister a callback by ID
    pub fn unregister(&self, id: CallbackId) -> bool {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        let removed = callbacks.len() != before;

        if removed {
            debug!(callback_id = %id, group = %self.group, "Unregistered callback");
        }
        removed
    }

    /// Invoke every registered callback with `data`.
    ///
    /// Returns how many callbacks ran. Failures are logged and do not stop
    /// the remaining callbacks.
    pub fn trigger(&self, data: &T) -> usize {
        let snapshot: Vec<(CallbackId, Callback<T>)> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, callback) in &snapshot {
            if let Err(e) = callback(data) {
                error!(
                    callback_id = %id,
                    group = %self.group,
                    error = %e,
                    "Callback execution failed"
                );
            }
        }

        snapshot.len()
    }

    /// Get the number of registered callbacks
    pub fn count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear all registered callbacks
    pub fn clear(&self) {
        let mut callbacks = self
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let count = callbacks.len();
        callbacks.clear();
        debug!(group = %self.group, count = count, "Cleared all callbacks");
    }
}
