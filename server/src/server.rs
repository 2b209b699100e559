//! Server setup and lifecycle for the loglens server.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use config::MonitorConfig;
use simulator::{StoreSink, TrafficSimulator};

use crate::error::{Result, ServerError};
use crate::routes::create_router;
use crate::state::AppState;

/// The loglens HTTP server.
pub struct LogMonitorServer {
    state: Arc<AppState>,
    simulator_handle: Option<tokio::task::JoinHandle<()>>,
}

impl LogMonitorServer {
    /// Creates a new server instance with the given configuration.
    pub async fn new(config: MonitorConfig) -> Result<Self> {
        let state = Arc::new(AppState::new(config).await?);
        Ok(Self {
            state,
            simulator_handle: None,
        })
    }

    /// Creates a server instance from existing `AppState`.
    #[must_use]
    pub fn with_state(state: Arc<AppState>) -> Self {
        Self {
            state,
            simulator_handle: None,
        }
    }

    /// Starts the synthetic traffic generator in the background, if enabled.
    pub fn start_simulator(&mut self) {
        if !self.state.config.server.enable_simulator {
            tracing::info!("traffic simulator disabled by configuration");
            return;
        }

        let sink = StoreSink::new(self.state.store.clone());
        let seed = self.state.config.simulator.seed;
        let handle = tokio::spawn(async move {
            TrafficSimulator::new(sink, seed).run().await;
        });

        self.simulator_handle = Some(handle);
        tracing::info!("traffic simulator started");
    }

    /// Runs the HTTP server.
    ///
    /// This method blocks until the server is shut down (e.g., via Ctrl+C).
    pub async fn run(mut self) -> Result<()> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.state.config.server.host, self.state.config.server.port
        )
        .parse()
        .map_err(|e| ServerError::Configuration(format!("Invalid address: {e}")))?;

        self.start_simulator();

        let router = create_router(self.state.clone());

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind to {addr}: {e}")))?;

        tracing::info!(%addr, "loglens server starting");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {e}")))?;

        if let Some(handle) = self.simulator_handle.take() {
            handle.abort();
        }

        tracing::info!("loglens server stopped");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

/// Signal handler for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}

/// Entry point for running the server from configuration.
pub async fn run_server(config: MonitorConfig) -> Result<()> {
    let server = LogMonitorServer::new(config).await?;
    server.run().await
}

/// Entry point for running the server from environment variables.
///
/// This is a convenience function for containerized deployments.
pub async fn run_from_env() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = MonitorConfig::from_env();
    run_server(config).await
}
