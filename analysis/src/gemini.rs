//! Gemini inference backend over the generative language REST API.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use errors::InferenceError;
use futures_util::{Stream, StreamExt};
use lens_core::traits::{InferenceBackend, TokenStream};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the Gemini `generateContent` / `streamGenerateContent`
/// endpoints. HTTP 429 maps to the distinguished rate-limit condition; any
/// other failure maps to a generic backend failure.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u16,
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let parts = self
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() { None } else { Some(text) }
    }
}

impl GeminiBackend {
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    /// Overrides the API base URL. Used by tests against a local mock
    /// server.
    #[must_use]
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            api_key,
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn classify_status(status: StatusCode, body: &str) -> InferenceError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            InferenceError::RateLimited
        } else {
            InferenceError::Backend {
                reason: format!("HTTP {status}: {body}"),
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(GENERATE_TIMEOUT)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(InferenceError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let parsed: GenerateResponse = response.json().await.map_err(InferenceError::backend)?;
        if let Some(error) = parsed.error {
            return Err(classify_api_error(&error));
        }
        parsed
            .text()
            .ok_or_else(|| InferenceError::backend("empty response from model"))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, InferenceError> {
        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(InferenceError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        Ok(sse_token_stream(response.bytes_stream()))
    }
}

fn classify_api_error(error: &ApiError) -> InferenceError {
    if error.code == 429 {
        InferenceError::RateLimited
    } else {
        InferenceError::Backend {
            reason: format!("API error {}: {}", error.code, error.message),
        }
    }
}

enum SseEvent {
    Text(String),
    Fault(InferenceError),
}

/// Parses one `data:` line of the SSE body. Keepalives, comments and
/// unparseable lines are skipped.
fn parse_sse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    let chunk: GenerateResponse = serde_json::from_str(data).ok()?;
    if let Some(error) = chunk.error {
        return Some(SseEvent::Fault(classify_api_error(&error)));
    }
    chunk.text().map(SseEvent::Text)
}

struct SseParser<S> {
    inner: Pin<Box<S>>,
    buf: String,
    done: bool,
}

fn sse_token_stream<S, B, E>(inner: S) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let parser = SseParser {
        inner: Box::pin(inner),
        buf: String::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(parser, |mut p| async move {
        if p.done {
            return None;
        }
        loop {
            // Drain complete lines from the buffer before reading more.
            while let Some(pos) = p.buf.find('\n') {
                let line: String = p.buf.drain(..=pos).collect();
                match parse_sse_line(line.trim()) {
                    Some(SseEvent::Text(text)) => return Some((Ok(text), p)),
                    Some(SseEvent::Fault(e)) => {
                        p.done = true;
                        return Some((Err(e), p));
                    }
                    None => {}
                }
            }
            match p.inner.next().await {
                Some(Ok(bytes)) => p.buf.push_str(&String::from_utf8_lossy(bytes.as_ref())),
                Some(Err(e)) => {
                    p.done = true;
                    return Some((Err(InferenceError::backend(e)), p));
                }
                None => return None,
            }
        }
    }))
}
