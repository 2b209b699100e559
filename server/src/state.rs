//! Application state for the loglens server.

use std::sync::Arc;

use analysis::AnalysisService;
use config::MonitorConfig;
use lens_core::traits::LogStore;
use storage::{MemoryLogStore, SqliteLogStore};

use crate::error::{Result, ServerError};

/// Shared application state for Axum handlers.
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub analysis: AnalysisService,
    pub config: Arc<MonitorConfig>,
}

impl AppState {
    /// Creates application state from configuration: selects the store
    /// backend and wires the analysis service.
    pub async fn new(config: MonitorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ServerError::Configuration(e.to_string()))?;

        let store: Arc<dyn LogStore> = match &config.server.database_url {
            Some(url) => {
                tracing::info!(%url, "using SQLite log store");
                Arc::new(SqliteLogStore::connect(url).await?)
            }
            None => {
                tracing::info!("using in-memory log store");
                Arc::new(MemoryLogStore::new())
            }
        };

        let analysis = AnalysisService::new(&config.ai, store.clone());

        Ok(Self {
            store,
            analysis,
            config: Arc::new(config),
        })
    }

    /// Creates application state from pre-built parts (useful for testing).
    #[must_use]
    pub fn with_parts(
        store: Arc<dyn LogStore>,
        analysis: AnalysisService,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            analysis,
            config: Arc::new(config),
        }
    }
}
