//! Scripted assistant for testing.
//!
//! Implements the AssistantProvider port without calling any real API so the
//! relay can be exercised end to end.
//!
//! # Features
//!
//! - Scripted streaming runs (events consumed run by run)
//! - Scripted polling status sequences and final reply text
//! - Error injection on every call
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let assistant = ScriptedAssistant::new()
//!     .with_stream(vec![
//!         AssistantEvent::TextDelta("Hello ".into()),
//!         AssistantEvent::TextDelta("world".into()),
//!         AssistantEvent::Completed,
//!     ]);
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::foundation::{RunId, ThreadId};
use crate::ports::{
    AssistantError, AssistantEvent, AssistantEventStream, AssistantProvider, RunSnapshot,
    RunStatus,
};

/// One recorded call against the scripted assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantCall {
    CreateThread,
    AddUserMessage { thread_id: String, content: String },
    StreamRun { thread_id: String },
    CreateRun { thread_id: String },
    RunStatus { thread_id: String, run_id: String },
    LatestReply { thread_id: String },
}

/// One step of a scripted streaming run.
pub type ScriptStep = Result<AssistantEvent, AssistantError>;

/// Assistant provider driven entirely by test scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAssistant {
    streams: Arc<Mutex<VecDeque<Vec<ScriptStep>>>>,
    statuses: Arc<Mutex<VecDeque<RunSnapshot>>>,
    reply: Arc<Mutex<Option<String>>>,
    create_thread_error: Arc<Mutex<Option<AssistantError>>>,
    add_message_error: Arc<Mutex<Option<AssistantError>>>,
    stream_run_error: Arc<Mutex<Option<AssistantError>>>,
    event_delay: Duration,
    thread_counter: Arc<AtomicUsize>,
    run_counter: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<AssistantCall>>>,
}

impl ScriptedAssistant {
    /// Creates an assistant that answers "Mock reply" when nothing is scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a streaming run made of successful events.
    pub fn with_stream(self, events: Vec<AssistantEvent>) -> Self {
        self.with_stream_steps(events.into_iter().map(Ok).collect())
    }

    /// Queues a streaming run that may fail part way.
    pub fn with_stream_steps(self, steps: Vec<ScriptStep>) -> Self {
        self.streams.lock().unwrap().push_back(steps);
        self
    }

    /// Queues run statuses returned by successive polls.
    ///
    /// The last status repeats once the queue is drained.
    pub fn with_run_statuses(self, statuses: Vec<RunSnapshot>) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    /// Sets the text returned as the newest assistant message.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        *self.reply.lock().unwrap() = Some(reply.into());
        self
    }

    /// Makes thread creation fail.
    pub fn failing_create_thread(self, error: AssistantError) -> Self {
        *self.create_thread_error.lock().unwrap() = Some(error);
        self
    }

    /// Makes posting the user message fail.
    pub fn failing_add_message(self, error: AssistantError) -> Self {
        *self.add_message_error.lock().unwrap() = Some(error);
        self
    }

    /// Makes starting a streaming run fail.
    pub fn failing_stream_run(self, error: AssistantError) -> Self {
        *self.stream_run_error.lock().unwrap() = Some(error);
        self
    }

    /// Sleeps before every streamed event.
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = delay;
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<AssistantCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of threads created so far.
    pub fn threads_created(&self) -> usize {
        self.thread_counter.load(Ordering::SeqCst)
    }

    /// Returns the number of status polls made so far.
    pub fn poll_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, AssistantCall::RunStatus { .. }))
            .count()
    }

    fn record(&self, call: AssistantCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_stream(&self) -> Vec<ScriptStep> {
        self.streams.lock().unwrap().pop_front().unwrap_or_else(|| {
            vec![
                Ok(AssistantEvent::TextDelta("Mock reply".to_string())),
                Ok(AssistantEvent::Completed),
            ]
        })
    }

    fn next_status(&self) -> RunSnapshot {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or_else(|| RunSnapshot::new(RunStatus::Completed))
        } else {
            statuses
                .front()
                .cloned()
                .unwrap_or_else(|| RunSnapshot::new(RunStatus::Completed))
        }
    }
}

#[async_trait]
impl AssistantProvider for ScriptedAssistant {
    async fn create_thread(&self) -> Result<ThreadId, AssistantError> {
        self.record(AssistantCall::CreateThread);
        if let Some(error) = self.create_thread_error.lock().unwrap().clone() {
            return Err(error);
        }
        let n = self.thread_counter.fetch_add(1, Ordering::SeqCst) + 1;
        ThreadId::new(format!("thread_mock_{}", n)).map_err(|e| AssistantError::malformed(e.to_string()))
    }

    async fn add_user_message(
        &self,
        thread_id: &ThreadId,
        content: &str,
    ) -> Result<(), AssistantError> {
        self.record(AssistantCall::AddUserMessage {
            thread_id: thread_id.to_string(),
            content: content.to_string(),
        });
        match self.add_message_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn stream_run(&self, thread_id: &ThreadId) -> Result<AssistantEventStream, AssistantError> {
        self.record(AssistantCall::StreamRun {
            thread_id: thread_id.to_string(),
        });
        if let Some(error) = self.stream_run_error.lock().unwrap().clone() {
            return Err(error);
        }

        let delay = self.event_delay;
        let steps = stream::iter(self.next_stream()).then(move |step| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            step
        });
        Ok(Box::pin(steps))
    }

    async fn create_run(&self, thread_id: &ThreadId) -> Result<RunId, AssistantError> {
        self.record(AssistantCall::CreateRun {
            thread_id: thread_id.to_string(),
        });
        let n = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        RunId::new(format!("run_mock_{}", n)).map_err(|e| AssistantError::malformed(e.to_string()))
    }

    async fn run_status(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunSnapshot, AssistantError> {
        self.record(AssistantCall::RunStatus {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
        });
        Ok(self.next_status())
    }

    async fn latest_reply(&self, thread_id: &ThreadId) -> Result<Option<String>, AssistantError> {
        self.record(AssistantCall::LatestReply {
            thread_id: thread_id.to_string(),
        });
        Ok(self.reply.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
