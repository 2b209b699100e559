//! Delivery sinks for generated entries.

use std::sync::Arc;

use async_trait::async_trait;
use errors::SimulatorError;
use lens_core::traits::LogStore;
use lens_core::types::NewLogEntry;

/// Destination for generated log entries.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn deliver(&self, entry: NewLogEntry) -> Result<(), SimulatorError>;
}

/// Writes entries straight into the shared log store. Used when the
/// generator runs inside the server process.
pub struct StoreSink {
    store: Arc<dyn LogStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LogSink for StoreSink {
    async fn deliver(&self, entry: NewLogEntry) -> Result<(), SimulatorError> {
        self.store
            .append(entry)
            .await
            .map(|_| ())
            .map_err(|e| SimulatorError::Delivery {
                target: "log store".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Posts entries to a running server's ingestion endpoint. Used by the
/// standalone simulator binary.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/logs", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn deliver(&self, entry: NewLogEntry) -> Result<(), SimulatorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&entry)
            .send()
            .await
            .map_err(|e| SimulatorError::Delivery {
                target: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SimulatorError::Delivery {
                target: self.endpoint.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}
