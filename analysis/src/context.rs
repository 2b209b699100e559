//! Context window construction.

use std::sync::Arc;

use errors::StoreError;
use lens_core::traits::LogStore;
use lens_core::types::LogEntry;

/// Builds bounded, chronologically ordered context windows from the log
/// store. Pure read; store failures propagate to the caller and are not
/// retried here.
#[derive(Clone)]
pub struct ContextWindowProvider {
    store: Arc<dyn LogStore>,
}

impl ContextWindowProvider {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Returns the `n` most recent entries, oldest first, length <= `n`.
    pub async fn window(&self, n: usize) -> Result<Vec<LogEntry>, StoreError> {
        self.store.recent(n).await
    }
}
