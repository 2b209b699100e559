//! Bounded in-memory log store.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use errors::StoreError;
use lens_core::traits::LogStore;
use lens_core::types::{LogEntry, LogLevel, NewLogEntry};
use tokio::sync::RwLock;

const DEFAULT_CAPACITY: usize = 10_000;

/// In-memory ring store. Oldest entries are evicted once `capacity` is
/// reached. Ids are assigned monotonically and never reused.
pub struct MemoryLogStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

struct Inner {
    entries: VecDeque<LogEntry>,
    next_id: i64,
}

impl MemoryLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: VecDeque::new(),
                next_id: 1,
            }),
            capacity,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let stored = entry.into_entry(Some(id), Utc::now());
        inner.entries.push_back(stored.clone());
        if inner.entries.len() > self.capacity {
            inner.entries.pop_front();
        }
        Ok(stored)
    }

    async fn recent(&self, n: usize) -> Result<Vec<LogEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut sorted: Vec<LogEntry> = inner.entries.iter().cloned().collect();
        sorted.sort_by_key(|e| (e.timestamp, e.id));

        let skip = sorted.len().saturating_sub(n);
        Ok(sorted.split_off(skip))
    }

    async fn recent_filtered(
        &self,
        level: Option<LogLevel>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut sorted: Vec<LogEntry> = inner
            .entries
            .iter()
            .filter(|e| level.is_none_or(|l| e.level == l))
            .cloned()
            .collect();
        sorted.sort_by_key(|e| std::cmp::Reverse((e.timestamp, e.id)));
        sorted.truncate(limit);
        Ok(sorted)
    }
}
