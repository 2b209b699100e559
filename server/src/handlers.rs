//! HTTP request handlers for the loglens server.

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::StreamExt;
use lens_core::types::{LogEntry, LogLevel, NewLogEntry};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 50;

/// Liveness response for the root route.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "Log Monitor API is running".to_string(),
    })
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

/// Health check endpoint.
///
/// Returns 200 if the server is healthy and the log store is reachable.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.recent_filtered(None, 1).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                store: "connected".to_string(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    store: "disconnected".to_string(),
                }),
            )
        }
    }
}

/// POST /logs
///
/// Ingests one log event. A missing timestamp is stamped at append time.
pub async fn ingest_log(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<NewLogEntry>,
) -> Result<Json<LogEntry>> {
    let stored = state.store.append(entry).await?;
    tracing::debug!(
        id = stored.id,
        service = %stored.service,
        level = %stored.level,
        "ingested log entry"
    );
    Ok(Json(stored))
}

/// Query parameters for the log listing.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
    pub level: Option<String>,
}

/// GET /logs
///
/// Returns up to `limit` entries (default 50), newest first, optionally
/// filtered by level.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>> {
    let level = query
        .level
        .as_deref()
        .map(LogLevel::from_str)
        .transpose()
        .map_err(|_| {
            ServerError::InvalidRequest(format!(
                "unknown level: {}",
                query.level.as_deref().unwrap_or_default()
            ))
        })?;

    let entries = state
        .store
        .recent_filtered(level, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(entries))
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Chat response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// POST /chat
///
/// Resolves one complete answer. Every AI outcome (including rate-limit
/// exhaustion and backend failures) arrives as a 200 with text; only store
/// failures surface as errors.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let answer = state.analysis.answer(&request.message).await?;
    Ok(Json(ChatResponse { answer }))
}

/// POST /chat/stream
///
/// Streams the answer incrementally as plain text chunks.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse> {
    let chunks = state.analysis.answer_stream(&request.message).await?;
    let body = Body::from_stream(chunks.map(Ok::<_, Infallible>));
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}
