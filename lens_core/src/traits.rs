//! Core traits for the loglens monitoring system.

use std::pin::Pin;

use async_trait::async_trait;
use errors::{InferenceError, StoreError};
use futures_util::Stream;

use crate::types::{LogEntry, LogLevel, NewLogEntry};

/// Raw chunk sequence produced by a streaming inference backend.
///
/// Items may fail mid-stream; the analysis client decides whether a failure
/// is retryable.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, InferenceError>> + Send>>;

/// Resolved chunk sequence delivered to a caller of the streaming analysis
/// path. Lazy, finite, non-restartable; every outcome (including errors) has
/// already been folded into plain text chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Append-only log event store.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persists an incoming event, stamping a timestamp if none was given,
    /// and returns the stored entry with its assigned id.
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError>;

    /// Returns the `n` most recent entries in chronological (oldest-first)
    /// order, length <= `n`. Must not mutate the store.
    async fn recent(&self, n: usize) -> Result<Vec<LogEntry>, StoreError>;

    /// Returns up to `limit` entries, newest first, optionally filtered by
    /// level. This is the dashboard listing shape.
    async fn recent_filtered(
        &self,
        level: Option<LogLevel>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, StoreError>;
}

/// External inference capability.
///
/// Both operations may fail with the distinguished `RateLimited` condition
/// or a generic `Backend` failure; retry policy belongs to the caller.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generates one complete answer for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Opens a streaming generation. Opening may fail outright; the returned
    /// stream may also fail mid-response.
    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceError>;
}
