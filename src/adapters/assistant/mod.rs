//! Assistant Provider Adapters.
//!
//! Implementations of the AssistantProvider port.
//!
//! ## Available Adapters
//!
//! - `OpenAIAssistant` - OpenAI Assistants v2 API (threads + runs)
//! - `ScriptedAssistant` - Scripted provider for tests and local development

mod mock_assistant;
mod openai_assistant;

pub use mock_assistant::{AssistantCall, ScriptStep, ScriptedAssistant};
pub use openai_assistant::{OpenAIAssistant, OpenAIAssistantConfig};
