//! # Loglens Errors
//!
//! Error handling for the loglens monitoring system.
//!
//! - Uses `thiserror` for structured error definitions
//! - Provides `Display` and `Error` trait implementations
//! - Includes error context for debugging

use thiserror::Error;

/// Outcome of a failed inference backend call.
///
/// Drives the retry state machine in the analysis clients: `RateLimited` is
/// transient and eligible for retry; `Backend` is treated as non-transient
/// and surfaced immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("rate limited by inference backend")]
    RateLimited,

    #[error("inference backend failure: {reason}")]
    Backend { reason: String },
}

impl InferenceError {
    /// Builds a `Backend` error from any displayable failure.
    pub fn backend(reason: impl std::fmt::Display) -> Self {
        Self::Backend {
            reason: reason.to_string(),
        }
    }
}

/// Log store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row for entry {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Synthetic traffic delivery errors.
///
/// A failed delivery is logged and skipped by the generator loop; it is
/// never fatal to the loop itself.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("delivery to {target} failed: {reason}")]
    Delivery { target: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("missing required setting: {name}")]
    Missing { name: String },
}
