//! # Analysis Pipeline
//!
//! The resilient AI-query pipeline: builds a bounded context window from
//! stored logs, renders a fixed-structure prompt, and obtains an answer from
//! an external inference backend with bounded recovery from rate limiting.
//!
//! Two delivery modes share the pipeline:
//! - blocking: one resolved answer string, exponential backoff
//! - streaming: incremental chunks with inline status notices, fixed-interval
//!   backoff and a smaller attempt budget
//!
//! Every outcome resolves to text; callers are never exposed to a raw
//! backend fault.

pub mod backoff;
pub mod context;
pub mod gemini;
pub mod mock;
pub mod prompt;
pub mod service;

pub use backoff::BackoffPolicy;
pub use context::ContextWindowProvider;
pub use gemini::GeminiBackend;
pub use prompt::render_prompt;
pub use service::{
    AnalysisService, BUSY_NOTICE, ConfiguredAnalysis, OVERLOADED_NOTICE, UNCONFIGURED_NOTICE,
};
