//! Analysis service: the retry state machines for both delivery modes.

use std::sync::Arc;

use config::AiConfig;
use errors::{InferenceError, StoreError};
use futures_util::StreamExt;
use futures_util::stream;
use lens_core::traits::{ChunkStream, InferenceBackend, LogStore, TokenStream};
use metrics::counter;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::backoff::BackoffPolicy;
use crate::context::ContextWindowProvider;
use crate::gemini::GeminiBackend;
use crate::prompt::render_prompt;

/// Canned response when no backend credential was configured.
pub const UNCONFIGURED_NOTICE: &str = "AI Service is not configured (missing API Key).";

/// Canned response when every attempt was rate limited.
pub const OVERLOADED_NOTICE: &str =
    "AI is currently overloaded (Rate Limit Exceeded). Please try again in a moment.";

/// Inline status chunk emitted by the streaming path before a retry wait.
pub const BUSY_NOTICE: &str = "AI service is busy (rate limited). Waiting 10s before retrying...";

fn failure_text(reason: &str) -> String {
    format!("Error communicating with AI: {reason}")
}

/// The analysis capability, as an explicit variant rather than a runtime
/// credential check: the canned-response path is statically complete.
pub enum AnalysisService {
    Configured(ConfiguredAnalysis),
    Unconfigured,
}

impl AnalysisService {
    /// Builds the service from configuration, wiring a Gemini backend when a
    /// credential is present.
    pub fn new(config: &AiConfig, store: Arc<dyn LogStore>) -> Self {
        match &config.api_key {
            Some(key) => {
                let backend = Arc::new(GeminiBackend::new(key.clone(), config.model.clone()));
                Self::Configured(ConfiguredAnalysis::new(store, backend, config))
            }
            None => {
                tracing::warn!("no inference credential configured; AI features disabled");
                Self::Unconfigured
            }
        }
    }

    /// Builds a configured service over an explicit backend. Used by tests
    /// and alternative deployments.
    pub fn with_backend(
        config: &AiConfig,
        store: Arc<dyn LogStore>,
        backend: Arc<dyn InferenceBackend>,
    ) -> Self {
        Self::Configured(ConfiguredAnalysis::new(store, backend, config))
    }

    /// Resolves one complete answer. Every inference outcome folds into the
    /// returned text; only store failures propagate as errors.
    pub async fn answer(&self, question: &str) -> Result<String, StoreError> {
        match self {
            Self::Unconfigured => Ok(UNCONFIGURED_NOTICE.to_string()),
            Self::Configured(inner) => inner.answer(question).await,
        }
    }

    /// Opens a chunk stream for the answer. For an unconfigured service the
    /// stream carries the single canned notice.
    pub async fn answer_stream(&self, question: &str) -> Result<ChunkStream, StoreError> {
        match self {
            Self::Unconfigured => Ok(Box::pin(stream::iter(vec![UNCONFIGURED_NOTICE.to_string()]))),
            Self::Configured(inner) => inner.answer_stream(question).await,
        }
    }
}

/// Analysis pipeline with a reachable backend.
pub struct ConfiguredAnalysis {
    provider: ContextWindowProvider,
    backend: Arc<dyn InferenceBackend>,
    blocking_window: usize,
    streaming_window: usize,
    blocking_attempts: u32,
    streaming_attempts: u32,
    blocking_backoff: BackoffPolicy,
    streaming_backoff: BackoffPolicy,
}

impl ConfiguredAnalysis {
    pub fn new(
        store: Arc<dyn LogStore>,
        backend: Arc<dyn InferenceBackend>,
        config: &AiConfig,
    ) -> Self {
        Self {
            provider: ContextWindowProvider::new(store),
            backend,
            blocking_window: config.blocking_window,
            streaming_window: config.streaming_window,
            blocking_attempts: config.blocking_attempts,
            streaming_attempts: config.streaming_attempts,
            blocking_backoff: BackoffPolicy::blocking(),
            streaming_backoff: BackoffPolicy::streaming(),
        }
    }

    /// Blocking mode: up to `blocking_attempts` attempts with exponential
    /// backoff on rate limiting. The waits are local to this request's task
    /// and never block sibling requests.
    pub async fn answer(&self, question: &str) -> Result<String, StoreError> {
        let window = self.provider.window(self.blocking_window).await?;
        let prompt = render_prompt(question, &window);

        let mut attempt: u32 = 0;
        loop {
            match self.backend.generate(&prompt).await {
                Ok(text) => return Ok(text),
                Err(InferenceError::RateLimited) => {
                    counter!("loglens_ai_rate_limited_total").increment(1);
                    if attempt + 1 >= self.blocking_attempts {
                        counter!("loglens_ai_exhausted_total").increment(1);
                        tracing::warn!(
                            attempts = self.blocking_attempts,
                            "rate limit retries exhausted"
                        );
                        return Ok(OVERLOADED_NOTICE.to_string());
                    }
                    let delay = self.blocking_backoff.delay(attempt);
                    tracing::warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        "rate limited; backing off before retry"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(InferenceError::Backend { reason }) => {
                    // Non-transient by assumption: fail fast, no retry.
                    tracing::error!(error = %reason, "inference backend failure");
                    return Ok(failure_text(&reason));
                }
            }
        }
    }

    /// Streaming mode: up to `streaming_attempts` attempts with a flat wait,
    /// emitting an inline busy notice instead of going silent. Chunks are
    /// forwarded in arrival order; notices are interleaved only before a
    /// retry or at final exhaustion.
    pub async fn answer_stream(&self, question: &str) -> Result<ChunkStream, StoreError> {
        let window = self.provider.window(self.streaming_window).await?;
        let prompt = render_prompt(question, &window);

        let backend = Arc::clone(&self.backend);
        let attempts = self.streaming_attempts;
        let backoff = self.streaming_backoff;
        let (tx, rx) = mpsc::channel::<String>(16);

        tokio::spawn(async move {
            pump_stream(backend, prompt, attempts, backoff, tx).await;
        });

        Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })))
    }
}

enum TokenOutcome {
    Completed,
    ConsumerGone,
    Failed(InferenceError),
}

/// Forwards backend chunks to the consumer until the stream ends, the
/// consumer goes away, or the backend fails. The backend stream handle is
/// dropped on return.
async fn forward_tokens(
    mut tokens: TokenStream,
    tx: &mpsc::Sender<String>,
    forwarded: &mut bool,
) -> TokenOutcome {
    while let Some(item) = tokens.next().await {
        match item {
            Ok(chunk) => {
                if chunk.is_empty() {
                    continue;
                }
                *forwarded = true;
                if tx.send(chunk).await.is_err() {
                    return TokenOutcome::ConsumerGone;
                }
            }
            Err(e) => return TokenOutcome::Failed(e),
        }
    }
    TokenOutcome::Completed
}

async fn pump_stream(
    backend: Arc<dyn InferenceBackend>,
    prompt: String,
    attempts: u32,
    backoff: BackoffPolicy,
    tx: mpsc::Sender<String>,
) {
    let mut forwarded = false;
    let mut attempt: u32 = 0;

    loop {
        let failure = match backend.generate_stream(&prompt).await {
            Ok(tokens) => match forward_tokens(tokens, &tx, &mut forwarded).await {
                TokenOutcome::Completed | TokenOutcome::ConsumerGone => return,
                TokenOutcome::Failed(e) => e,
            },
            Err(e) => e,
        };

        match failure {
            InferenceError::RateLimited => {
                counter!("loglens_ai_rate_limited_total").increment(1);
                // Retrying after content has been forwarded would duplicate
                // model output; treat it like exhaustion.
                if forwarded || attempt + 1 >= attempts {
                    counter!("loglens_ai_exhausted_total").increment(1);
                    tracing::warn!(attempt, "streaming rate limit retries exhausted");
                    let _ = tx.send(OVERLOADED_NOTICE.to_string()).await;
                    return;
                }
                if tx.send(BUSY_NOTICE.to_string()).await.is_err() {
                    return;
                }
                let delay = backoff.delay(attempt);
                tracing::warn!(
                    attempt,
                    delay_secs = delay.as_secs(),
                    "streaming attempt rate limited; backing off"
                );
                // Give up the wait immediately if the consumer stops.
                tokio::select! {
                    () = tx.closed() => return,
                    () = sleep(delay) => {}
                }
                attempt += 1;
            }
            InferenceError::Backend { reason } => {
                tracing::error!(error = %reason, "streaming backend failure");
                let _ = tx.send(failure_text(&reason)).await;
                return;
            }
        }
    }
}
