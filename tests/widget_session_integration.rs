//! End-to-end tests for the widget client against a live relay.
//!
//! The relay runs on an ephemeral port with a scripted assistant; the
//! session talks to it through the HTTP relay client and persists to a
//! file-backed local store in a temporary directory.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::Router;
use futures::stream;
use tempfile::TempDir;

use widget_relay::adapters::assistant::AssistantCall;
use widget_relay::adapters::http::{relay_router, ChatAppState};
use widget_relay::adapters::{
    FileLocalStorage, HttpRelayClient, HttpRelayClientConfig, ScriptedAssistant,
};
use widget_relay::application::handlers::widget::{MESSAGES_KEY, THREAD_ID_KEY};
use widget_relay::application::{ChatSession, RelayChatHandler};
use widget_relay::config::ServerConfig;
use widget_relay::domain::conversation::{MessageStatus, Role, WidgetSettings};
use widget_relay::domain::relay::RelayMode;
use widget_relay::ports::{AssistantError, AssistantEvent, LocalStorage};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    base_url: String,
    mode: RelayMode,
    _dir: TempDir,
    storage: Arc<FileLocalStorage>,
}

impl Harness {
    async fn start(assistant: ScriptedAssistant, mode: RelayMode) -> Self {
        let relay = RelayChatHandler::new(Arc::new(assistant))
            .with_polling(Duration::from_millis(10), 5);
        let app = relay_router(
            ChatAppState::new(Arc::new(relay), mode),
            &ServerConfig::default(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let storage = Arc::new(FileLocalStorage::new(dir.path().join("local_storage.json")));

        Self {
            base_url: format!("http://{}", addr),
            mode,
            _dir: dir,
            storage,
        }
    }

    async fn open_session(&self) -> ChatSession {
        self.open_session_as(self.mode).await
    }

    async fn open_session_as(&self, mode: RelayMode) -> ChatSession {
        let client = HttpRelayClient::new(
            HttpRelayClientConfig::new(&self.base_url, mode)
                .with_timeout(Duration::from_secs(5)),
        )
        .unwrap();

        ChatSession::open(
            Arc::new(client),
            self.storage.clone(),
            WidgetSettings::default(),
        )
        .await
        .unwrap()
    }
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn streamed_reply_is_accumulated_and_persisted() {
    let assistant = ScriptedAssistant::new().with_stream(vec![
        AssistantEvent::TextDelta("Hello".to_string()),
        AssistantEvent::TextDelta(" world".to_string()),
        AssistantEvent::Completed,
    ]);
    let harness = Harness::start(assistant, RelayMode::Streaming).await;
    let session = harness.open_session().await;

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Complete);
    let conversation = session.conversation().await;
    assert_eq!(conversation.thread_id().map(|t| t.as_str()), Some("thread_mock_1"));
    let messages = conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role(), Role::User);
    assert_eq!(messages[0].content(), "Hi");
    assert_eq!(messages[1].role(), Role::Assistant);
    assert_eq!(messages[1].content(), "Hello world");
    assert!(session.view().input_enabled);

    assert_eq!(
        harness.storage.get_item(THREAD_ID_KEY).await.unwrap().as_deref(),
        Some("thread_mock_1")
    );

    // A fresh session on the same storage sees the same transcript.
    let reopened = harness.open_session().await;
    assert_eq!(reopened.conversation().await, conversation);
}

#[tokio::test]
async fn follow_up_reuses_the_thread() {
    let assistant = ScriptedAssistant::new();
    let harness = Harness::start(assistant.clone(), RelayMode::Streaming).await;
    let session = harness.open_session().await;

    session.send("First").await.unwrap();
    session.send("Second").await.unwrap();

    assert_eq!(assistant.threads_created(), 1);
    let posted_to: Vec<String> = assistant
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            AssistantCall::AddUserMessage { thread_id, .. } => Some(thread_id),
            _ => None,
        })
        .collect();
    assert_eq!(posted_to, vec!["thread_mock_1", "thread_mock_1"]);
    assert_eq!(session.conversation().await.messages().len(), 4);
}

#[tokio::test]
async fn upstream_failure_becomes_an_error_reply() {
    let assistant = ScriptedAssistant::new().failing_add_message(AssistantError::RateLimited);
    let harness = Harness::start(assistant, RelayMode::Streaming).await;
    let session = harness.open_session().await;

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Error);
    let conversation = session.conversation().await;
    let reply = &conversation.messages()[1];
    assert!(reply.content().starts_with(&session.settings().error_prefix));
    assert!(session.view().input_enabled);
}

#[tokio::test]
async fn unreachable_relay_shows_network_notice() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileLocalStorage::new(dir.path().join("local_storage.json")));
    // Port 9 (discard) is not served by anything in the test environment.
    let client = HttpRelayClient::new(
        HttpRelayClientConfig::new("http://127.0.0.1:9", RelayMode::Streaming)
            .with_timeout(Duration::from_secs(2)),
    )
    .unwrap();
    let session = ChatSession::open(Arc::new(client), storage, WidgetSettings::default())
        .await
        .unwrap();

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Error);
    let conversation = session.conversation().await;
    assert_eq!(
        conversation.messages()[1].content(),
        session.settings().network_error
    );
}

#[tokio::test]
async fn reset_clears_transcript_and_storage() {
    let harness = Harness::start(ScriptedAssistant::new(), RelayMode::Streaming).await;
    let session = harness.open_session().await;
    session.send("Hi").await.unwrap();

    session.reset().await.unwrap();

    assert!(session.conversation().await.is_empty());
    assert!(session.conversation().await.thread_id().is_none());
    assert_eq!(harness.storage.get_item(THREAD_ID_KEY).await.unwrap(), None);
    assert_eq!(harness.storage.get_item(MESSAGES_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn garbled_frame_mid_stream_fails_the_reply() {
    // A relay that breaks framing after the first fragment.
    let app = Router::new().route(
        "/chat",
        post(|| async {
            let frames = ["{\"content\":\"Hel\"}", "not json", "[DONE]"]
                .map(|data| Ok::<_, Infallible>(Event::default().data(data)));
            Sse::new(stream::iter(frames))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileLocalStorage::new(dir.path().join("local_storage.json")));
    let client = HttpRelayClient::new(HttpRelayClientConfig::new(
        format!("http://{}", addr),
        RelayMode::Streaming,
    ))
    .unwrap();
    let session = ChatSession::open(Arc::new(client), storage, WidgetSettings::default())
        .await
        .unwrap();

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Error);
    let conversation = session.conversation().await;
    assert_eq!(
        conversation.messages()[1].content(),
        session.settings().network_error
    );
}

#[tokio::test]
async fn client_in_the_other_mode_gets_an_error_reply() {
    let harness = Harness::start(ScriptedAssistant::new(), RelayMode::Streaming).await;
    let session = harness.open_session_as(RelayMode::Polling).await;

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Error);
    let conversation = session.conversation().await;
    assert_eq!(
        conversation.messages()[1].content(),
        session.settings().network_error
    );
    assert!(session.view().input_enabled);
}

#[tokio::test]
async fn marker_split_across_deltas_keeps_the_word_gap() {
    let assistant = ScriptedAssistant::new().with_stream(vec![
        AssistantEvent::TextDelta("The answer".to_string()),
        AssistantEvent::TextDelta("【12:3†source.pdf】".to_string()),
        AssistantEvent::TextDelta("is 42".to_string()),
        AssistantEvent::Completed,
    ]);
    let harness = Harness::start(assistant, RelayMode::Streaming).await;
    let session = harness.open_session().await;

    session.send("?").await.unwrap();

    let conversation = session.conversation().await;
    assert_eq!(conversation.messages()[1].content(), "The answer is 42");
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test]
async fn polled_reply_completes_in_one_step() {
    let assistant = ScriptedAssistant::new().with_reply("Polled answer");
    let harness = Harness::start(assistant, RelayMode::Polling).await;
    let session = harness.open_session().await;

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Complete);
    let conversation = session.conversation().await;
    assert_eq!(conversation.messages()[1].content(), "Polled answer");
    assert_eq!(conversation.thread_id().map(|t| t.as_str()), Some("thread_mock_1"));
}

#[tokio::test]
async fn polled_failure_shows_relay_error() {
    // No reply text scripted: the relay answers 502.
    let harness = Harness::start(ScriptedAssistant::new(), RelayMode::Polling).await;
    let session = harness.open_session().await;

    let status = session.send("Hi").await.unwrap();

    assert_eq!(status, MessageStatus::Error);
    let conversation = session.conversation().await;
    assert!(conversation.messages()[1]
        .content()
        .starts_with(&session.settings().error_prefix));
}
