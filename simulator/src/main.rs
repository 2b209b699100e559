//! Standalone traffic simulator: posts synthetic entries to a running
//! loglens server.

use config::SimulatorConfig;
use simulator::{HttpSink, TrafficSimulator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = SimulatorConfig::from_env();
    let target = config
        .target_url
        .unwrap_or_else(|| "http://localhost:8000".to_string());

    tracing::info!(%target, "starting traffic simulation");
    let simulator = TrafficSimulator::new(HttpSink::new(&target), config.seed);
    simulator.run().await;
    Ok(())
}
