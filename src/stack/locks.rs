//! Per-stack mutual exclusion for Compose verbs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

/// Shared map from stack id to the async mutex guarding it.
///
/// Cloning shares the map. Entries are created on first use and removed by
/// [`StackLocks::forget`] when the stack is deleted.
#[derive(Debug, Clone, Default)]
pub struct StackLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl StackLocks {
    /// Create an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `stack_id`, created if absent.
    #[must_use]
    pub fn lock_for(&self, stack_id: i64) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(stack_id).or_default())
    }

    /// Drop the entry for `stack_id`.
    ///
    /// Holders of the old mutex keep it; later callers get a fresh one.
    pub fn forget(&self, stack_id: i64) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&stack_id);
    }

    /// Number of stacks with a live entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no stack has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
