//! Gemini backend against a mock HTTP server.

use analysis::GeminiBackend;
use errors::InferenceError;
use futures_util::StreamExt;
use lens_core::traits::InferenceBackend;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> GeminiBackend {
    GeminiBackend::with_base_url(
        "test-key".to_string(),
        "gemini-2.0-flash".to_string(),
        server.uri(),
    )
}

#[tokio::test]
async fn generate_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "analyze this"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "all systems nominal"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let answer = backend.generate("analyze this").await.unwrap();
    assert_eq!(answer, "all systems nominal");
}

#[tokio::test]
async fn generate_maps_429_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.generate("analyze this").await.unwrap_err();
    assert_eq!(err, InferenceError::RateLimited);
}

#[tokio::test]
async fn generate_maps_server_errors_to_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.generate("analyze this").await.unwrap_err();
    assert!(matches!(err, InferenceError::Backend { .. }));
}

#[tokio::test]
async fn stream_yields_chunks_in_order() {
    let server = MockServer::start().await;
    let sse_body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" world\"}]}}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body.as_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let stream = backend.generate_stream("analyze this").await.unwrap();
    let chunks: Vec<Result<String, InferenceError>> = stream.collect().await;

    let texts: Vec<String> = chunks.into_iter().map(Result::unwrap).collect();
    assert_eq!(texts, vec!["Hello".to_string(), " world".to_string()]);
}

#[tokio::test]
async fn stream_open_maps_429_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.generate_stream("analyze this").await.err().unwrap();
    assert_eq!(err, InferenceError::RateLimited);
}

#[tokio::test]
async fn mid_stream_error_item_surfaces_as_fault() {
    let server = MockServer::start().await;
    let sse_body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}]}}]}\n\n",
        "data: {\"error\":{\"code\":429,\"message\":\"quota exceeded\"}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body.as_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let stream = backend.generate_stream("analyze this").await.unwrap();
    let chunks: Vec<Result<String, InferenceError>> = stream.collect().await;

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].as_deref().unwrap(), "partial");
    assert_eq!(chunks[1], Err(InferenceError::RateLimited));
}
