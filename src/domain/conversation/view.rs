//! Render-ready projections of a conversation.
//!
//! The UI owns no state: it draws whatever `ConversationView` says.

use serde::{Deserialize, Serialize};

use super::{Conversation, MessageStatus, Role};

/// Display strings and toggles for the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    pub title: String,
    pub welcome_text: String,
    pub show_powered_by: bool,
    pub input_placeholder: String,
    /// Shown in place of a pending reply.
    pub loading_api: String,
    /// Shown while the widget itself boots.
    pub loading_app: String,
    pub tooltip_reset: String,
    pub tooltip_close: String,
    /// Prefix for errors reported by the relay.
    pub error_prefix: String,
    /// Shown when the relay could not be reached.
    pub network_error: String,
    /// Shown for a reply that completed without text.
    pub empty_reply: String,
    /// Shown for a reply cut off by a reload.
    pub interrupted: String,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            title: "AI ChatBot".to_string(),
            welcome_text: String::new(),
            show_powered_by: true,
            input_placeholder: "Type your message...".to_string(),
            loading_api: "Thinking...".to_string(),
            loading_app: "Loading chat...".to_string(),
            tooltip_reset: "Reset chat".to_string(),
            tooltip_close: "Close chat".to_string(),
            error_prefix: "Error: ".to_string(),
            network_error: "Network or server failure.".to_string(),
            empty_reply: "Empty reply.".to_string(),
            interrupted: "Reply interrupted.".to_string(),
        }
    }
}

impl WidgetSettings {
    /// User-facing text for an error reported by the relay.
    pub fn relay_error(&self, message: &str) -> String {
        format!("{}{}", self.error_prefix, message)
    }
}

/// One transcript row as the UI should draw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub role: Role,
    pub text: String,
    pub status: MessageStatus,
    /// Show a spinner or typing cursor.
    pub is_transient: bool,
}

/// Snapshot of everything the widget renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub title: String,
    pub welcome_text: Option<String>,
    pub messages: Vec<MessageView>,
    /// False while a send is in flight.
    pub input_enabled: bool,
    pub input_placeholder: String,
    pub show_powered_by: bool,
    pub tooltip_reset: String,
    pub tooltip_close: String,
    /// Set only while the stored conversation is still loading.
    pub boot_text: Option<String>,
    pub thread_id: Option<String>,
}

impl ConversationView {
    /// What the widget shows before its stored conversation is restored.
    pub fn booting(settings: &WidgetSettings) -> Self {
        let mut view = Self::render(&Conversation::new(), settings, true);
        view.boot_text = Some(settings.loading_app.clone());
        view
    }

    /// Projects a conversation for display.
    pub fn render(conversation: &Conversation, settings: &WidgetSettings, sending: bool) -> Self {
        let messages = conversation
            .messages()
            .iter()
            .map(|m| {
                let text = match (m.status(), m.content().is_empty()) {
                    (MessageStatus::Pending, _) => settings.loading_api.clone(),
                    (MessageStatus::Complete, true) if m.role() == Role::Assistant => {
                        settings.empty_reply.clone()
                    }
                    _ => m.content().to_string(),
                };
                MessageView {
                    role: m.role(),
                    text,
                    status: m.status(),
                    is_transient: m.status().is_transient(),
                }
            })
            .collect();

        Self {
            title: settings.title.clone(),
            welcome_text: Some(settings.welcome_text.clone()).filter(|t| !t.is_empty()),
            messages,
            input_enabled: !sending && !conversation.is_awaiting_reply(),
            input_placeholder: settings.input_placeholder.clone(),
            show_powered_by: settings.show_powered_by,
            tooltip_reset: settings.tooltip_reset.clone(),
            tooltip_close: settings.tooltip_close.clone(),
            boot_text: None,
            thread_id: conversation.thread_id().map(|t| t.to_string()),
        }
    }
}
