//! The generator loop.

use metrics::counter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::sleep;

use crate::model::IncidentState;
use crate::sink::LogSink;

/// Endless synthetic traffic loop. One instance owns its own RNG and
/// incident state; instances are independent and safe to run concurrently.
pub struct TrafficSimulator<S: LogSink> {
    state: IncidentState,
    rng: StdRng,
    sink: S,
}

impl<S: LogSink> TrafficSimulator<S> {
    pub fn new(sink: S, seed: Option<u64>) -> Self {
        Self {
            state: IncidentState::new(),
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
            sink,
        }
    }

    /// Runs until the owning task is dropped or aborted. A failed delivery
    /// is logged and skipped; it never terminates the loop.
    pub async fn run(mut self) {
        tracing::info!("traffic simulator started");
        loop {
            let emission = self.state.tick(&mut self.rng);
            for entry in emission.entries {
                match self.sink.deliver(entry).await {
                    Ok(()) => {
                        counter!("loglens_sim_entries_total").increment(1);
                    }
                    Err(e) => {
                        counter!("loglens_sim_delivery_failures_total").increment(1);
                        tracing::warn!(error = %e, "failed to deliver synthetic entry; skipping");
                    }
                }
            }
            sleep(emission.pause).await;
        }
    }
}
