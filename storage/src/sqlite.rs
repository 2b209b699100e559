//! SQLite-backed log store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use errors::StoreError;
use lens_core::traits::LogStore;
use lens_core::types::{LogEntry, LogLevel, NewLogEntry};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    level TEXT NOT NULL,
    service TEXT NOT NULL,
    message TEXT NOT NULL
)
";

/// SQLite store. Timestamps are stored as fixed-width RFC 3339 text so the
/// column's lexicographic order matches chronological order.
pub struct SqliteLogStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct LogRow {
    id: i64,
    timestamp: String,
    level: String,
    service: String,
    message: String,
}

impl LogRow {
    fn into_entry(self) -> Result<LogEntry, StoreError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt {
                id: self.id,
                reason: e.to_string(),
            })?;
        let level = LogLevel::from_str(&self.level).map_err(|_| StoreError::Corrupt {
            id: self.id,
            reason: format!("unknown level {:?}", self.level),
        })?;
        Ok(LogEntry {
            id: Some(self.id),
            timestamp,
            level,
            service: self.service,
            message: self.message,
        })
    }
}

impl SqliteLogStore {
    /// Connects to the given SQLite URL and ensures the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Opens a private in-memory database. A single connection keeps the
    /// database alive for the pool's lifetime.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    fn encode_timestamp(ts: DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry, StoreError> {
        let stored = entry.into_entry(None, Utc::now());
        let result = sqlx::query(
            "INSERT INTO logs (timestamp, level, service, message) VALUES (?, ?, ?, ?)",
        )
        .bind(Self::encode_timestamp(stored.timestamp))
        .bind(stored.level.to_string())
        .bind(&stored.service)
        .bind(&stored.message)
        .execute(&self.pool)
        .await?;

        Ok(LogEntry {
            id: Some(result.last_insert_rowid()),
            ..stored
        })
    }

    async fn recent(&self, n: usize) -> Result<Vec<LogEntry>, StoreError> {
        let rows: Vec<LogRow> = sqlx::query_as(
            "SELECT id, timestamp, level, service, message FROM logs \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        // Newest-first from the query; callers get oldest-first.
        let mut entries = rows
            .into_iter()
            .map(LogRow::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    async fn recent_filtered(
        &self,
        level: Option<LogLevel>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, StoreError> {
        let rows: Vec<LogRow> = match level {
            Some(level) => {
                sqlx::query_as(
                    "SELECT id, timestamp, level, service, message FROM logs \
                     WHERE level = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
                )
                .bind(level.to_string())
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, timestamp, level, service, message FROM logs \
                     ORDER BY timestamp DESC, id DESC LIMIT ?",
                )
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(LogRow::into_entry).collect()
    }
}
