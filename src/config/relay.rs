//! Relay gateway configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::relay::RelayMode;

/// How `/chat` talks to clients and how long polling may wait.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Streaming (SSE) or polling (single JSON reply)
    #[serde(default)]
    pub mode: RelayMode,

    /// Delay between run status checks in polling mode
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Status checks before polling gives up with a timeout
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl RelayConfig {
    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Time spent sleeping between polls before a run times out
    pub fn max_poll_wait(&self) -> Duration {
        self.poll_interval() * self.max_poll_attempts.saturating_sub(1)
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(100..=60_000).contains(&self.poll_interval_ms) {
            return Err(ValidationError::InvalidPollInterval);
        }
        if !(1..=600).contains(&self.max_poll_attempts) {
            return Err(ValidationError::InvalidPollAttempts);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::default(),
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_max_poll_attempts() -> u32 {
    60
}
