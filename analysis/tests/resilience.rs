//! Retry behavior of both analysis modes against a scripted backend.
//!
//! Timing assertions run under tokio's paused clock, so the virtual waits
//! are exact.

use std::sync::Arc;
use std::time::Duration;

use analysis::mock::{ScriptedBackend, ScriptedCall};
use analysis::{AnalysisService, BUSY_NOTICE, OVERLOADED_NOTICE, UNCONFIGURED_NOTICE};
use config::AiConfig;
use errors::InferenceError;
use futures_util::StreamExt;
use lens_core::traits::LogStore;
use lens_core::types::{LogLevel, NewLogEntry};
use storage::MemoryLogStore;

fn test_config() -> AiConfig {
    AiConfig::builder().api_key("test-key").build().unwrap()
}

fn service_with(script: Vec<ScriptedCall>) -> (AnalysisService, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend::new(script));
    let store = Arc::new(MemoryLogStore::new());
    let service = AnalysisService::with_backend(&test_config(), store, backend.clone());
    (service, backend)
}

async fn collect(stream: lens_core::traits::ChunkStream) -> Vec<String> {
    stream.collect().await
}

#[tokio::test(start_paused = true)]
async fn blocking_exhaustion_waits_the_full_schedule() {
    let (service, backend) = service_with(vec![
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
    ]);

    let start = tokio::time::Instant::now();
    let answer = service.answer("what is failing?").await.unwrap();

    assert_eq!(answer, OVERLOADED_NOTICE);
    assert_eq!(backend.calls(), 5);
    // 5 + 10 + 20 + 40; the final attempt never waits.
    assert_eq!(start.elapsed(), Duration::from_secs(75));
}

#[tokio::test(start_paused = true)]
async fn blocking_recovers_after_two_rate_limits() {
    let (service, backend) = service_with(vec![
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::Answer("db-shard-01 is overloaded".to_string()),
    ]);

    let start = tokio::time::Instant::now();
    let answer = service.answer("anything wrong?").await.unwrap();

    assert_eq!(answer, "db-shard-01 is overloaded");
    assert_eq!(backend.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn blocking_fails_fast_on_backend_failure() {
    let (service, backend) = service_with(vec![ScriptedCall::Failure("boom".to_string())]);

    let start = tokio::time::Instant::now();
    let answer = service.answer("anything wrong?").await.unwrap();

    assert_eq!(answer, "Error communicating with AI: boom");
    assert_eq!(backend.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn streaming_recovers_with_busy_notices_in_order() {
    let (service, backend) = service_with(vec![
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::Stream(vec![
            Ok("The ".to_string()),
            Ok("disk ".to_string()),
            Ok("is full".to_string()),
        ]),
    ]);

    let start = tokio::time::Instant::now();
    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(
        chunks,
        vec![
            BUSY_NOTICE.to_string(),
            BUSY_NOTICE.to_string(),
            "The ".to_string(),
            "disk ".to_string(),
            "is full".to_string(),
        ]
    );
    assert_eq!(backend.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn streaming_exhaustion_ends_with_terminal_notice() {
    let (service, backend) = service_with(vec![
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
    ]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(
        chunks,
        vec![
            BUSY_NOTICE.to_string(),
            BUSY_NOTICE.to_string(),
            OVERLOADED_NOTICE.to_string(),
        ]
    );
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn streaming_fails_fast_on_backend_failure() {
    let (service, backend) = service_with(vec![ScriptedCall::Failure("kaput".to_string())]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(chunks, vec!["Error communicating with AI: kaput".to_string()]);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn mid_stream_failure_ends_after_forwarded_content() {
    let (service, backend) = service_with(vec![ScriptedCall::Stream(vec![
        Ok("partial answer".to_string()),
        Err(InferenceError::Backend {
            reason: "connection reset".to_string(),
        }),
    ])]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(
        chunks,
        vec![
            "partial answer".to_string(),
            "Error communicating with AI: connection reset".to_string(),
        ]
    );
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn mid_stream_rate_limit_before_content_is_retried() {
    let (service, backend) = service_with(vec![
        ScriptedCall::Stream(vec![Err(InferenceError::RateLimited)]),
        ScriptedCall::Stream(vec![Ok("all healthy".to_string())]),
    ]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(
        chunks,
        vec![BUSY_NOTICE.to_string(), "all healthy".to_string()]
    );
    assert_eq!(backend.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn mid_stream_rate_limit_after_content_is_terminal() {
    let (service, backend) = service_with(vec![ScriptedCall::Stream(vec![
        Ok("some output".to_string()),
        Err(InferenceError::RateLimited),
    ])]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(
        chunks,
        vec!["some output".to_string(), OVERLOADED_NOTICE.to_string()]
    );
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn empty_chunks_are_not_forwarded() {
    let (service, _backend) = service_with(vec![ScriptedCall::Stream(vec![
        Ok(String::new()),
        Ok("visible".to_string()),
        Ok(String::new()),
    ])]);

    let stream = service.answer_stream("what happened?").await.unwrap();
    let chunks = collect(stream).await;

    assert_eq!(chunks, vec!["visible".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_stream_cancels_retries() {
    let (service, backend) = service_with(vec![
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
        ScriptedCall::RateLimited,
    ]);

    let mut stream = service.answer_stream("what happened?").await.unwrap();
    let first = stream.next().await.unwrap();
    assert_eq!(first, BUSY_NOTICE);
    drop(stream);

    // Well past the remaining backoff; no further attempt may start.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn unconfigured_service_returns_notice_without_backend() {
    let store: Arc<dyn LogStore> = Arc::new(MemoryLogStore::new());
    let config = AiConfig::default();
    assert!(config.api_key.is_none());
    let service = AnalysisService::new(&config, store);

    let answer = service.answer("anything?").await.unwrap();
    assert_eq!(answer, UNCONFIGURED_NOTICE);

    let chunks = collect(service.answer_stream("anything?").await.unwrap()).await;
    assert_eq!(chunks, vec![UNCONFIGURED_NOTICE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn prompt_carries_the_context_window_and_question() {
    let backend = Arc::new(ScriptedBackend::new(vec![ScriptedCall::Answer(
        "ok".to_string(),
    )]));
    let store = Arc::new(MemoryLogStore::new());
    store
        .append(NewLogEntry::new(
            LogLevel::Error,
            "payment-gateway",
            "Database connection timeout",
        ))
        .await
        .unwrap();
    let service = AnalysisService::with_backend(&test_config(), store, backend.clone());

    service.answer("why did payments fail?").await.unwrap();

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("ERROR (payment-gateway): Database connection timeout"));
    assert!(prompts[0].contains("User Question: why did payments fail?"));
}
