//! ChatSession - Client-side driver of one widget conversation.
//!
//! Owns the transcript, talks to the relay through a `RelayTransport`, and
//! persists through a `ConversationStore` after every mutation. The UI only
//! reads `ConversationView` snapshots from a watch channel.

use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use super::ConversationStore;
use crate::domain::conversation::{
    Conversation, ConversationError, ConversationView, MessageStatus, WidgetSettings,
};
use crate::domain::relay::StreamEvent;
use crate::ports::{LocalStorage, RelayReply, RelayTransport, StorageError, TransportError};

/// Errors returned to the widget UI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("A message is already being sent")]
    SendInFlight,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Clears the in-flight flag however the send ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One widget conversation bound to a relay and a local store.
pub struct ChatSession {
    transport: Arc<dyn RelayTransport>,
    store: ConversationStore,
    settings: WidgetSettings,
    conversation: Mutex<Conversation>,
    in_flight: AtomicBool,
    views: watch::Sender<ConversationView>,
}

impl ChatSession {
    /// Opens the session, restoring any persisted conversation.
    pub async fn open(
        transport: Arc<dyn RelayTransport>,
        storage: Arc<dyn LocalStorage>,
        settings: WidgetSettings,
    ) -> Result<Self, ClientError> {
        let store = ConversationStore::new(storage);
        let conversation = store.load(&settings.interrupted).await?;
        let (views, _) = watch::channel(ConversationView::render(&conversation, &settings, false));

        tracing::debug!(
            messages = conversation.messages().len(),
            has_thread = conversation.thread_id().is_some(),
            mode = ?transport.mode(),
            "chat session opened"
        );

        Ok(Self {
            transport,
            store,
            settings,
            conversation: Mutex::new(conversation),
            in_flight: AtomicBool::new(false),
            views,
        })
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.views.subscribe()
    }

    /// Latest rendered snapshot.
    pub fn view(&self) -> ConversationView {
        self.views.borrow().clone()
    }

    pub fn settings(&self) -> &WidgetSettings {
        &self.settings
    }

    /// Copy of the current conversation.
    pub async fn conversation(&self) -> Conversation {
        self.conversation.lock().await.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sends one message and drives its reply to a terminal state.
    ///
    /// Returns the reply's final status. Relay and network failures end up
    /// in the transcript as an `Error` reply, not as an `Err` here.
    pub async fn send(&self, text: &str) -> Result<MessageStatus, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let guard = self.claim()?;

        let thread_id = {
            let mut conv = self.conversation.lock().await;
            conv.begin_exchange(text).map_err(|e| match e {
                ConversationError::Validation(_) => ClientError::EmptyMessage,
                _ => ClientError::SendInFlight,
            })?;
            if let Err(e) = self.commit(&conv, true).await {
                tracing::warn!(error = %e, "failed to persist outgoing message");
            }
            conv.thread_id().cloned()
        };

        match self.transport.send(text, thread_id.as_ref()).await {
            Ok(RelayReply::Complete { content, thread_id }) => {
                let mut conv = self.conversation.lock().await;
                if let Some(thread_id) = thread_id {
                    conv.set_thread_id(thread_id);
                }
                self.apply(&mut conv, |c| c.replace_reply(&content));
            }
            Ok(RelayReply::Stream(mut events)) => loop {
                let next = events.next().await;
                let mut conv = self.conversation.lock().await;
                match next {
                    Some(Ok(StreamEvent::Info { thread_id })) => {
                        tracing::debug!(thread_id = %thread_id, "relay opened a thread");
                        conv.set_thread_id(thread_id);
                    }
                    Some(Ok(StreamEvent::Content(fragment))) => {
                        self.apply(&mut conv, |c| c.append_to_reply(&fragment));
                    }
                    Some(Ok(StreamEvent::Error(message))) => {
                        let notice = self.settings.relay_error(&message);
                        self.apply(&mut conv, |c| c.fail_reply(&notice));
                        break;
                    }
                    Some(Ok(StreamEvent::Done)) => {
                        self.apply(&mut conv, |c| c.complete_reply());
                        break;
                    }
                    Some(Err(e)) => {
                        let notice = self.transport_notice(&e);
                        self.apply(&mut conv, |c| c.fail_reply(&notice));
                        break;
                    }
                    None => {
                        tracing::warn!("relay stream ended without a terminal marker");
                        let notice = self.settings.interrupted.clone();
                        self.apply(&mut conv, |c| c.fail_reply(&notice));
                        break;
                    }
                }
                if let Err(e) = self.commit(&conv, true).await {
                    tracing::warn!(error = %e, "failed to persist streamed reply");
                }
            },
            Err(e) => {
                let notice = self.transport_notice(&e);
                let mut conv = self.conversation.lock().await;
                self.apply(&mut conv, |c| c.fail_reply(&notice));
            }
        }

        drop(guard);
        let conv = self.conversation.lock().await;
        self.commit(&conv, false).await?;
        Ok(conv.reply_status().unwrap_or_default())
    }

    /// Clears the transcript and the continuation token.
    pub async fn reset(&self) -> Result<(), ClientError> {
        let _guard = self.claim()?;
        let mut conv = self.conversation.lock().await;
        self.store.reset().await?;
        conv.clear();
        self.views
            .send_replace(ConversationView::render(&conv, &self.settings, false));
        tracing::debug!("chat session reset");
        Ok(())
    }

    /// Posts feedback about a reply to the relay.
    pub async fn send_feedback(&self, payload: serde_json::Value) -> Result<(), ClientError> {
        self.transport.send_feedback(payload).await?;
        Ok(())
    }

    /// Marks the session busy until the guard drops.
    fn claim(&self) -> Result<InFlightGuard<'_>, ClientError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::SendInFlight)?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Applies a reply mutation, failing the reply if the relay broke protocol.
    fn apply(
        &self,
        conv: &mut Conversation,
        mutation: impl FnOnce(&mut Conversation) -> Result<(), ConversationError>,
    ) {
        if let Err(e) = mutation(conv) {
            tracing::warn!(error = %e, "relay event did not fit the reply state");
            let notice = self.settings.relay_error(&e.to_string());
            let _ = conv.fail_reply(&notice);
        }
    }

    /// Saves and publishes the current state.
    async fn commit(&self, conv: &Conversation, sending: bool) -> Result<(), StorageError> {
        self.views
            .send_replace(ConversationView::render(conv, &self.settings, sending));
        self.store.save(conv).await
    }

    fn transport_notice(&self, error: &TransportError) -> String {
        tracing::warn!(error = %error, "relay request failed");
        match error.relay_message() {
            Some(message) => self.settings.relay_error(message),
            None => self.settings.network_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryLocalStorage;
    use crate::domain::conversation::Role;
    use crate::domain::foundation::ThreadId;
    use crate::domain::relay::RelayMode;
    use crate::ports::RelayEventStream;
    use async_trait::async_trait;
    use futures::stream;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Transport answering from a queue of canned replies.
    #[derive(Default)]
    struct CannedTransport {
        replies: std::sync::Mutex<VecDeque<Result<Canned, TransportError>>>,
        sent: std::sync::Mutex<Vec<(String, Option<String>)>>,
        delay: Duration,
    }

    enum Canned {
        Events(Vec<Result<StreamEvent, TransportError>>),
        Complete(String, Option<&'static str>),
    }

    impl CannedTransport {
        fn with(replies: Vec<Result<Canned, TransportError>>) -> Self {
            Self {
                replies: std::sync::Mutex::new(replies.into()),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<(String, Option<String>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelayTransport for CannedTransport {
        async fn send(
            &self,
            message: &str,
            thread_id: Option<&ThreadId>,
        ) -> Result<RelayReply, TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((message.to_string(), thread_id.map(|t| t.to_string())));
            let reply = self.replies.lock().unwrap().pop_front().unwrap();
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match reply? {
                Canned::Events(events) => {
                    let events: RelayEventStream = Box::pin(stream::iter(events));
                    Ok(RelayReply::Stream(events))
                }
                Canned::Complete(content, thread_id) => Ok(RelayReply::Complete {
                    content,
                    thread_id: thread_id.map(|t| ThreadId::new(t).unwrap()),
                }),
            }
        }

        async fn send_feedback(&self, _payload: serde_json::Value) -> Result<(), TransportError> {
            Ok(())
        }

        fn mode(&self) -> RelayMode {
            RelayMode::Streaming
        }
    }

    async fn session(transport: CannedTransport) -> (ChatSession, InMemoryLocalStorage) {
        let storage = InMemoryLocalStorage::new();
        let session = ChatSession::open(
            Arc::new(transport),
            Arc::new(storage.clone()),
            WidgetSettings::default(),
        )
        .await
        .unwrap();
        (session, storage)
    }

    fn info(id: &str) -> Result<StreamEvent, TransportError> {
        Ok(StreamEvent::Info {
            thread_id: ThreadId::new(id).unwrap(),
        })
    }

    fn content(text: &str) -> Result<StreamEvent, TransportError> {
        Ok(StreamEvent::content(text))
    }

    #[tokio::test]
    async fn streamed_reply_accumulates_and_stores_token() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            info("A"),
            content("Hello "),
            content("world"),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, storage) = session(transport).await;

        let status = session.send("Hi").await.unwrap();

        assert_eq!(status, MessageStatus::Complete);
        let conv = session.conversation().await;
        assert_eq!(conv.messages()[1].content(), "Hello world");
        assert_eq!(conv.thread_id().map(|t| t.as_str()), Some("A"));
        assert_eq!(
            storage.get_item("chatThreadId").await.unwrap().as_deref(),
            Some("A")
        );
    }

    #[tokio::test]
    async fn error_before_content_leaves_no_partial_text() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            Ok(StreamEvent::error("upstream down")),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, _) = session(transport).await;

        let status = session.send("Hi").await.unwrap();

        assert_eq!(status, MessageStatus::Error);
        let view = session.view();
        assert_eq!(view.messages[1].status, MessageStatus::Error);
        assert!(view.messages[1].text.contains("upstream down"));
        assert!(view.input_enabled);
    }

    #[tokio::test]
    async fn error_after_content_replaces_partial_text() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            content("Hel"),
            Ok(StreamEvent::error("run failed")),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, _) = session(transport).await;

        session.send("Hi").await.unwrap();

        let conv = session.conversation().await;
        assert_eq!(conv.messages()[1].content(), "Error: run failed");
    }

    #[tokio::test]
    async fn stream_without_done_is_interrupted() {
        let transport =
            CannedTransport::with(vec![Ok(Canned::Events(vec![content("Hel")]))]);
        let (session, _) = session(transport).await;

        let status = session.send("Hi").await.unwrap();

        assert_eq!(status, MessageStatus::Error);
        assert_eq!(session.view().messages[1].text, "Reply interrupted.");
    }

    #[tokio::test]
    async fn network_failure_fails_the_placeholder() {
        let transport = CannedTransport::with(vec![Err(TransportError::network("refused"))]);
        let (session, _) = session(transport).await;

        let status = session.send("Hi").await.unwrap();

        assert_eq!(status, MessageStatus::Error);
        assert_eq!(session.view().messages[1].text, "Network or server failure.");
    }

    #[tokio::test]
    async fn relay_error_status_shows_relay_message() {
        let transport = CannedTransport::with(vec![Err(TransportError::Status {
            status: 504,
            message: Some("Assistant did not finish within 60s".to_string()),
        })]);
        let (session, _) = session(transport).await;

        session.send("Hi").await.unwrap();

        assert_eq!(
            session.view().messages[1].text,
            "Error: Assistant did not finish within 60s"
        );
    }

    #[tokio::test]
    async fn polled_reply_replaces_placeholder() {
        let transport =
            CannedTransport::with(vec![Ok(Canned::Complete("42".to_string(), Some("thread_P")))]);
        let (session, _) = session(transport).await;

        let status = session.send("?").await.unwrap();

        assert_eq!(status, MessageStatus::Complete);
        let conv = session.conversation().await;
        assert_eq!(conv.messages()[1].content(), "42");
        assert_eq!(conv.thread_id().map(|t| t.as_str()), Some("thread_P"));
    }

    #[tokio::test]
    async fn stored_token_is_sent_on_next_exchange() {
        let transport = CannedTransport::with(vec![
            Ok(Canned::Events(vec![info("A"), content("1"), Ok(StreamEvent::Done)])),
            Ok(Canned::Events(vec![content("2"), Ok(StreamEvent::Done)])),
        ]);
        let transport = Arc::new(transport);
        let session = ChatSession::open(
            transport.clone(),
            Arc::new(InMemoryLocalStorage::new()),
            WidgetSettings::default(),
        )
        .await
        .unwrap();

        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        assert_eq!(
            transport.sent(),
            vec![
                ("first".to_string(), None),
                ("second".to_string(), Some("A".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn empty_message_is_rejected_untouched() {
        let (session, storage) = session(CannedTransport::default()).await;

        assert_eq!(session.send("  ").await.unwrap_err(), ClientError::EmptyMessage);
        assert!(session.conversation().await.is_empty());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_rejected() {
        let transport = CannedTransport {
            delay: Duration::from_millis(50),
            ..CannedTransport::with(vec![Ok(Canned::Events(vec![
                content("only"),
                Ok(StreamEvent::Done),
            ]))])
        };
        let (session, _) = session(transport).await;

        let (first, second) = tokio::join!(session.send("one"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.send("two").await
        });

        assert_eq!(first.unwrap(), MessageStatus::Complete);
        assert_eq!(second.unwrap_err(), ClientError::SendInFlight);
        let conv = session.conversation().await;
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].content(), "only");
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            info("A"),
            content("x"),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, storage) = session(transport).await;
        session.send("Hi").await.unwrap();

        session.reset().await.unwrap();

        assert!(session.conversation().await.is_empty());
        assert!(session.view().messages.is_empty());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn reset_while_sending_is_rejected() {
        let transport = CannedTransport {
            delay: Duration::from_millis(50),
            ..CannedTransport::with(vec![
                Ok(Canned::Events(vec![content("kept"), Ok(StreamEvent::Done)])),
                Ok(Canned::Events(vec![content("again"), Ok(StreamEvent::Done)])),
            ])
        };
        let (session, _) = session(transport).await;

        let (sent, reset) = tokio::join!(session.send("one"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.reset().await
        });

        assert_eq!(sent.unwrap(), MessageStatus::Complete);
        assert_eq!(reset.unwrap_err(), ClientError::SendInFlight);
        assert_eq!(session.conversation().await.messages()[1].content(), "kept");

        // A finished reset hands the session back for the next send.
        session.reset().await.unwrap();
        assert!(!session.is_sending());
        assert_eq!(session.send("two").await.unwrap(), MessageStatus::Complete);
    }

    #[tokio::test]
    async fn persisted_log_matches_memory_after_send() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            info("A"),
            content("Hello"),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, storage) = session(transport).await;
        session.send("Hi").await.unwrap();

        let reopened = ConversationStore::new(Arc::new(storage))
            .load("Reply interrupted.")
            .await
            .unwrap();
        assert_eq!(reopened, session.conversation().await);
    }

    #[tokio::test]
    async fn observers_see_each_increment() {
        let transport = CannedTransport::with(vec![Ok(Canned::Events(vec![
            content("a"),
            content("b"),
            Ok(StreamEvent::Done),
        ]))]);
        let (session, _) = session(transport).await;
        let mut views = session.subscribe();

        let observer = async {
            let mut seen = Vec::new();
            while views.changed().await.is_ok() {
                let view = views.borrow_and_update().clone();
                if let Some(reply) = view.messages.get(1) {
                    seen.push(reply.text.clone());
                }
                if view.input_enabled && !view.messages.is_empty() {
                    break;
                }
            }
            seen
        };
        let (status, seen) = tokio::join!(session.send("Hi"), observer);

        assert_eq!(status.unwrap(), MessageStatus::Complete);
        assert_eq!(seen.last().map(String::as_str), Some("ab"));
        assert!(session.view().messages.iter().any(|m| m.role == Role::User));
    }
}
