//! Scripted inference backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use errors::InferenceError;
use futures_util::stream;
use lens_core::traits::{InferenceBackend, TokenStream};

/// One scripted backend call outcome, consumed in order.
pub enum ScriptedCall {
    /// `generate` succeeds with this text; `generate_stream` yields it as a
    /// single chunk.
    Answer(String),
    /// The call reports rate limiting.
    RateLimited,
    /// The call reports a generic backend failure.
    Failure(String),
    /// `generate_stream` opens successfully and yields these items.
    Stream(Vec<Result<String, InferenceError>>),
}

/// Deterministic backend double: pops one scripted outcome per call and
/// records every received prompt.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptedCall>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new(script: Vec<ScriptedCall>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of backend calls made so far (both modes).
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn record(&self, prompt: &str) -> Option<ScriptedCall> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        match self.record(prompt) {
            Some(ScriptedCall::Answer(text)) => Ok(text),
            Some(ScriptedCall::RateLimited) => Err(InferenceError::RateLimited),
            Some(ScriptedCall::Failure(reason)) => Err(InferenceError::Backend { reason }),
            Some(ScriptedCall::Stream(_)) | None => Err(InferenceError::backend(
                "scripted backend: no blocking outcome left",
            )),
        }
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceError> {
        match self.record(prompt) {
            Some(ScriptedCall::Stream(items)) => Ok(Box::pin(stream::iter(items))),
            Some(ScriptedCall::Answer(text)) => Ok(Box::pin(stream::iter(vec![Ok(text)]))),
            Some(ScriptedCall::RateLimited) => Err(InferenceError::RateLimited),
            Some(ScriptedCall::Failure(reason)) => Err(InferenceError::Backend { reason }),
            None => Err(InferenceError::backend(
                "scripted backend: no streaming outcome left",
            )),
        }
    }
}
