//! HTTP handlers for the relay endpoints.
//!
//! These handlers connect Axum routes to the relay chat handler.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::application::handlers::relay::{RelayChatCommand, RelayChatHandler, RelayError};
use crate::domain::foundation::ThreadId;
use crate::domain::relay::{RelayMode, THREAD_ID_HEADER};

use super::dto::{ChatReplyResponse, ChatRequest, ErrorResponse, FeedbackResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for relay handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub relay: Arc<RelayChatHandler>,
    pub mode: RelayMode,
}

impl ChatAppState {
    pub fn new(relay: Arc<RelayChatHandler>, mode: RelayMode) -> Self {
        Self { relay, mode }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - Relay one user message.
///
/// The continuation token comes in the `x-thread-id` header.
///
/// # Responses
/// - streaming: `text/event-stream` of relay frames, ending with `[DONE]`
/// - polling: `{content}`, with the thread id echoed in `x-thread-id`
///
/// # Errors
/// - 400 Bad Request: missing, blank or oversized message
/// - 502 Bad Gateway: assistant failure (polling)
/// - 504 Gateway Timeout: run did not finish in time (polling)
pub async fn chat(
    State(state): State<ChatAppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ChatApiError> {
    let Json(request) = body.map_err(|e| ChatApiError::BadRequest(e.body_text()))?;
    let thread_id = thread_id_from(&headers)?;
    let cmd = RelayChatCommand::new(request.message, thread_id)?;

    match state.mode {
        RelayMode::Streaming => {
            let events = state
                .relay
                .handle_streaming(cmd)
                .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_sse_data())));
            Ok(Sse::new(events)
                .keep_alive(KeepAlive::default())
                .into_response())
        }
        RelayMode::Polling => {
            let reply = state.relay.handle_polling(cmd).await?;
            Ok((
                StatusCode::OK,
                [(THREAD_ID_HEADER, reply.thread_id.to_string())],
                Json(ChatReplyResponse {
                    content: reply.content,
                }),
            )
                .into_response())
        }
    }
}

/// Reads the continuation token; a blank header counts as absent.
fn thread_id_from(headers: &HeaderMap) -> Result<Option<ThreadId>, ChatApiError> {
    let Some(value) = headers.get(THREAD_ID_HEADER) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ChatApiError::BadRequest("Invalid x-thread-id header".to_string()))?;
    if value.trim().is_empty() {
        return Ok(None);
    }
    ThreadId::new(value)
        .map(Some)
        .map_err(|e| ChatApiError::BadRequest(e.to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /feedback
// ════════════════════════════════════════════════════════════════════════════════

/// POST /feedback - Accept free-form feedback.
///
/// The body is logged, never validated; the answer is always 200.
pub async fn feedback(body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => tracing::info!(%payload, "feedback received"),
        Err(_) => tracing::info!(bytes = body.len(), "non-JSON feedback received"),
    }
    (StatusCode::OK, Json(FeedbackResponse::ok()))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Liveness check.
pub async fn health() -> &'static str {
    "Widget relay is running"
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts relay errors to HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(String),
    BadGateway(String),
    GatewayTimeout(String),
}

impl From<RelayError> for ChatApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidMessage(e) => ChatApiError::BadRequest(e.to_string()),
            RelayError::Timeout { .. } => ChatApiError::GatewayTimeout(err.to_string()),
            _ => ChatApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ChatApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ChatApiError::BadGateway(msg) => {
                tracing::warn!("Relay failed: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ChatApiError::GatewayTimeout(msg) => {
                tracing::warn!("Relay timed out: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, msg)
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_means_new_thread() {
        assert_eq!(thread_id_from(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn blank_header_means_new_thread() {
        let mut headers = HeaderMap::new();
        headers.insert(THREAD_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(thread_id_from(&headers).unwrap(), None);
    }

    #[test]
    fn header_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(THREAD_ID_HEADER, HeaderValue::from_static("thread_A"));
        assert_eq!(
            thread_id_from(&headers).unwrap(),
            Some(ThreadId::new("thread_A").unwrap())
        );
    }

    #[test]
    fn relay_errors_map_to_statuses() {
        let cases = [
            (
                RelayError::InvalidMessage(crate::domain::foundation::ValidationError::empty_field(
                    "message",
                )),
                StatusCode::BAD_REQUEST,
            ),
            (RelayError::Timeout { waited_ms: 60_000 }, StatusCode::GATEWAY_TIMEOUT),
            (
                RelayError::UpstreamRunFailed("quota".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                RelayError::NetworkError("reset".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ChatApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn health_reports_running() {
        assert!(health().await.contains("running"));
    }
}
