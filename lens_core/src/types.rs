//! Data model for ingested log events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity of a log event.
///
/// Serializes as the upper-case wire form (`"INFO"`, `"WARN"`, `"ERROR"`)
/// used by ingesting services and the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A stored log event.
///
/// Immutable once created; owned by the log store. `id` is assigned by the
/// store at append time. Timestamps are non-decreasing within a single
/// ingestion stream, but out-of-order arrival across services is permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub service: String,
    pub message: String,
}

/// An incoming log event, before the store has accepted it.
///
/// A missing timestamp is stamped with the current time at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub service: String,
    pub message: String,
}

impl NewLogEntry {
    pub fn new(level: LogLevel, service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            level,
            service: service.into(),
            message: message.into(),
        }
    }

    /// Converts into a stored entry, stamping a timestamp if none was given.
    pub fn into_entry(self, id: Option<i64>, now: DateTime<Utc>) -> LogEntry {
        LogEntry {
            id,
            timestamp: self.timestamp.unwrap_or(now),
            level: self.level,
            service: self.service,
            message: self.message,
        }
    }
}
