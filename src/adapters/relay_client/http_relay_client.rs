//! HTTP Relay Client - Implementation of RelayTransport over reqwest.
//!
//! Talks to a relay gateway's `/chat` and `/feedback` endpoints. The client is
//! configured with one `RelayMode` and expects the gateway to answer in that
//! mode: a `text/event-stream` body for streaming, a JSON body for polling.
//! An answer in the other mode's content type is a malformed response.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::ThreadId;
use crate::domain::relay::{RelayMode, StreamEvent, THREAD_ID_HEADER};
use crate::ports::{RelayEventStream, RelayReply, RelayTransport, TransportError};

/// Configuration for the HTTP relay client.
#[derive(Debug, Clone)]
pub struct HttpRelayClientConfig {
    /// Gateway origin, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Mode the gateway is deployed in.
    pub mode: RelayMode,
    /// Timeout for connecting and, in polling mode, for the whole request.
    pub timeout: Duration,
}

impl HttpRelayClientConfig {
    /// Creates a configuration for the given gateway and mode.
    pub fn new(base_url: impl Into<String>, mode: RelayMode) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            mode,
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Relay transport over HTTP.
pub struct HttpRelayClient {
    config: HttpRelayClientConfig,
    client: Client,
}

impl HttpRelayClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: HttpRelayClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().connect_timeout(config.timeout);
        // A streamed reply may legitimately outlive any fixed request timeout.
        if config.mode == RelayMode::Polling {
            builder = builder.timeout(config.timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Maps non-success statuses onto `TransportError::Status`.
    async fn handle_response_status(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ChatResponseBody>(&body)
            .ok()
            .and_then(|b| b.error);

        Err(TransportError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Fails unless the response carries the configured mode's content type.
    fn expect_content_type(&self, response: &Response) -> Result<(), TransportError> {
        let expected = self.config.mode.content_type();
        let actual = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if actual.starts_with(expected) {
            Ok(())
        } else {
            Err(TransportError::malformed(format!(
                "expected {} response, got '{}'",
                expected, actual
            )))
        }
    }

    fn into_event_stream(response: Response) -> RelayEventStream {
        let mut frames = Box::pin(response.bytes_stream().eventsource());

        let stream = async_stream::stream! {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(frame) if frame.data.is_empty() => continue,
                    Ok(frame) => {
                        let event = StreamEvent::from_sse_data(&frame.data)
                            .map_err(|e| TransportError::malformed(e.to_string()));
                        let done = matches!(event, Ok(StreamEvent::Done) | Err(_));
                        yield event;
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(TransportError::network(format!("stream error: {}", e)));
                        return;
                    }
                }
            }
        };

        Box::pin(stream)
    }

    async fn into_complete_reply(response: Response) -> Result<RelayReply, TransportError> {
        let thread_id = response
            .headers()
            .get(THREAD_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| ThreadId::new(v).ok());

        let body: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| TransportError::malformed(format!("invalid JSON reply: {}", e)))?;

        match body {
            ChatResponseBody {
                content: Some(content),
                ..
            } => Ok(RelayReply::Complete { content, thread_id }),
            ChatResponseBody {
                error: Some(message),
                ..
            } => Err(TransportError::Status {
                status: 200,
                message: Some(message),
            }),
            _ => Err(TransportError::malformed("reply has neither content nor error")),
        }
    }
}

#[async_trait]
impl RelayTransport for HttpRelayClient {
    async fn send(
        &self,
        message: &str,
        thread_id: Option<&ThreadId>,
    ) -> Result<RelayReply, TransportError> {
        let mut request = self
            .client
            .post(self.url("/chat"))
            .json(&serde_json::json!({ "message": message }));
        if let Some(thread_id) = thread_id {
            request = request.header(THREAD_ID_HEADER, thread_id.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        let response = Self::handle_response_status(response).await?;
        self.expect_content_type(&response)?;

        match self.config.mode {
            RelayMode::Streaming => Ok(RelayReply::Stream(Self::into_event_stream(response))),
            RelayMode::Polling => Self::into_complete_reply(response).await,
        }
    }

    async fn send_feedback(&self, payload: serde_json::Value) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.url("/feedback"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        Self::handle_response_status(response).await?;
        Ok(())
    }

    fn mode(&self) -> RelayMode {
        self.config.mode
    }
}

/// `/chat` JSON body in polling mode and error bodies in both modes.
#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    content: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_trims_trailing_slash() {
        let config = HttpRelayClientConfig::new("http://localhost:8080/", RelayMode::Polling)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn client_reports_configured_mode() {
        let client =
            HttpRelayClient::new(HttpRelayClientConfig::new("http://localhost:1", RelayMode::Polling))
                .unwrap();
        assert_eq!(client.mode(), RelayMode::Polling);
        assert_eq!(client.url("/chat"), "http://localhost:1/chat");
    }

    #[test]
    fn error_body_parses() {
        let body: ChatResponseBody = serde_json::from_str(r#"{"error":"timed out"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("timed out"));
        assert!(body.content.is_none());
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_network_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let client = HttpRelayClient::new(
            HttpRelayClientConfig::new("http://127.0.0.1:9", RelayMode::Streaming)
                .with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let err = client.send("hi", None).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
