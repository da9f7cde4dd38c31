//! OpenAI Assistant - Implementation of AssistantProvider for the Assistants v2 API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIAssistantConfig::new(api_key, "asst_abc123")
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_timeout(Duration::from_secs(120));
//!
//! let assistant = OpenAIAssistant::new(config)?;
//! ```
//!
//! # Streaming
//!
//! A streaming run answers with Server-Sent Events whose `event:` field names
//! the kind (`thread.message.delta`, `thread.run.completed`, ...). Only the
//! events the relay cares about are surfaced as `AssistantEvent`s; everything
//! else (run steps, status chatter) is skipped.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::{RunId, ThreadId};
use crate::ports::{
    AssistantError, AssistantEvent, AssistantEventStream, AssistantProvider, RunSnapshot,
    RunStatus,
};

/// Configuration for the OpenAI assistant adapter.
#[derive(Debug, Clone)]
pub struct OpenAIAssistantConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Assistant that answers every run.
    pub assistant_id: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout. Also bounds a whole streaming run.
    pub timeout: Duration,
}

impl OpenAIAssistantConfig {
    /// Creates a new configuration with the given API key and assistant.
    pub fn new(api_key: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            assistant_id: assistant_id.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI Assistants API adapter.
pub struct OpenAIAssistant {
    config: OpenAIAssistantConfig,
    client: Client,
}

impl OpenAIAssistant {
    /// Creates a new adapter with the given configuration.
    pub fn new(config: OpenAIAssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Adds auth and beta headers shared by every call.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AssistantError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                AssistantError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else if e.is_connect() {
                AssistantError::network(format!("Connection failed: {}", e))
            } else {
                AssistantError::network(e.to_string())
            }
        })?;

        Self::handle_response_status(response).await
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, AssistantError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| AssistantError::malformed(format!("Failed to parse response: {}", e)))
    }

    /// Maps non-success statuses onto provider errors.
    async fn handle_response_status(response: Response) -> Result<Response, AssistantError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&error_body);

        match status.as_u16() {
            401 => Err(AssistantError::AuthenticationFailed),
            429 => Err(AssistantError::RateLimited),
            500..=599 => Err(AssistantError::unavailable(format!(
                "Server error {}: {}",
                status, message
            ))),
            _ => Err(AssistantError::unavailable(format!(
                "Unexpected status {}: {}",
                status, message
            ))),
        }
    }
}

#[async_trait]
impl AssistantProvider for OpenAIAssistant {
    async fn create_thread(&self) -> Result<ThreadId, AssistantError> {
        let thread: ApiObject = self
            .send_json(self.client.post(self.url("/threads")).json(&serde_json::json!({})))
            .await?;

        ThreadId::new(thread.id).map_err(|e| AssistantError::malformed(e.to_string()))
    }

    async fn add_user_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<(), AssistantError> {
        let path = format!("/threads/{}/messages", thread_id);
        self.send(
            self.client
                .post(self.url(&path))
                .json(&serde_json::json!({ "role": "user", "content": content })),
        )
        .await?;
        Ok(())
    }

    async fn stream_run(&self, thread_id: &ThreadId) -> Result<AssistantEventStream, AssistantError> {
        let path = format!("/threads/{}/runs", thread_id);
        let response = self
            .send(self.client.post(self.url(&path)).json(&serde_json::json!({
                "assistant_id": self.config.assistant_id,
                "stream": true,
            })))
            .await?;

        let mut events = Box::pin(response.bytes_stream().eventsource());

        let stream = async_stream::stream! {
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => match parse_run_event(&event.event, &event.data) {
                        Ok(Some(parsed)) => {
                            let terminal = !matches!(parsed, AssistantEvent::TextDelta(_));
                            yield Ok(parsed);
                            if terminal {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    },
                    Err(e) => {
                        yield Err(AssistantError::network(format!("Stream error: {}", e)));
                        return;
                    }
                }
            }
            yield Err(AssistantError::network("stream ended before the run finished"));
        };

        Ok(Box::pin(stream))
    }

    async fn create_run(&self, thread_id: &ThreadId) -> Result<RunId, AssistantError> {
        let path = format!("/threads/{}/runs", thread_id);
        let run: ApiObject = self
            .send_json(self.client.post(self.url(&path)).json(&serde_json::json!({
                "assistant_id": self.config.assistant_id,
            })))
            .await?;

        RunId::new(run.id).map_err(|e| AssistantError::malformed(e.to_string()))
    }

    async fn run_status(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunSnapshot, AssistantError> {
        let path = format!("/threads/{}/runs/{}", thread_id, run_id.as_str());
        let run: RunObject = self.send_json(self.client.get(self.url(&path))).await?;
        Ok(run.into_snapshot())
    }

    async fn latest_reply(&self, thread_id: &ThreadId) -> Result<Option<String>, AssistantError> {
        let path = format!("/threads/{}/messages?limit=1&order=desc", thread_id);
        let list: MessageList = self.send_json(self.client.get(self.url(&path))).await?;
        Ok(list.latest_assistant_text())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Maps one upstream SSE event onto an `AssistantEvent`.
///
/// Returns `Ok(None)` for events the relay ignores.
fn parse_run_event(event: &str, data: &str) -> Result<Option<AssistantEvent>, AssistantError> {
    match event {
        "thread.message.delta" => {
            let delta: MessageDeltaEvent = serde_json::from_str(data)
                .map_err(|e| AssistantError::malformed(format!("Bad message delta: {}", e)))?;
            let text = delta.text();
            Ok((!text.is_empty()).then_some(AssistantEvent::TextDelta(text)))
        }
        "thread.run.completed" => Ok(Some(AssistantEvent::Completed)),
        "thread.run.failed"
        | "thread.run.cancelled"
        | "thread.run.expired"
        | "thread.run.incomplete"
        | "thread.run.requires_action" => {
            let run: RunObject = serde_json::from_str(data)
                .map_err(|e| AssistantError::malformed(format!("Bad run object: {}", e)))?;
            Ok(Some(AssistantEvent::Failed(run.into_snapshot().failure_reason())))
        }
        "error" => Err(AssistantError::unavailable(parse_error_message(data))),
        "done" => Ok(Some(AssistantEvent::Completed)),
        _ => Ok(None),
    }
}

/// Pulls a readable message out of an API error body.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

// ----- OpenAI API Types -----

#[derive(Debug, Deserialize)]
struct ApiObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    status: RunStatus,
    last_error: Option<RunError>,
}

impl RunObject {
    fn into_snapshot(self) -> RunSnapshot {
        let snapshot = RunSnapshot::new(self.status);
        match self.last_error {
            Some(error) => snapshot.with_error(error.message),
            None => snapshot,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaEvent {
    delta: MessageDelta,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    content: Vec<ContentPart>,
}

impl MessageDeltaEvent {
    fn text(&self) -> String {
        self.delta.content.iter().filter_map(ContentPart::text).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextPart>,
}

impl ContentPart {
    fn text(&self) -> Option<&str> {
        if self.kind != "text" {
            return None;
        }
        self.text.as_ref().and_then(|t| t.value.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct TextPart {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

impl MessageList {
    fn latest_assistant_text(&self) -> Option<String> {
        let message = self.data.first().filter(|m| m.role == "assistant")?;
        let text: String = message.content.iter().filter_map(ContentPart::text).collect();
        (!text.is_empty()).then_some(text)
    }
}
