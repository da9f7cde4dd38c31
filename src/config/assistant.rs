//! Assistant provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Hosted assistant configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Provider API key
    pub api_key: Option<Secret<String>>,

    /// Assistant that answers every thread
    pub assistant_id: Option<String>,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds (also bounds a streaming run)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AssistantConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate assistant configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        use secrecy::ExposeSecret;

        if !self
            .api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
        {
            return Err(ValidationError::MissingRequired("ASSISTANT__API_KEY"));
        }
        if !self
            .assistant_id
            .as_ref()
            .is_some_and(|id| !id.trim().is_empty())
        {
            return Err(ValidationError::MissingRequired("ASSISTANT__ASSISTANT_ID"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::BaseUrlMustBeHttps);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AssistantConfig {
        AssistantConfig {
            api_key: Some(Secret::new("sk-test".to_string())),
            assistant_id: Some("asst_123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_assistant_config_defaults() {
        let config = AssistantConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_validation_requires_api_key() {
        let config = AssistantConfig {
            api_key: None,
            ..configured()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::MissingRequired("ASSISTANT__API_KEY"))
        );
    }

    #[test]
    fn test_validation_requires_assistant_id() {
        let config = AssistantConfig {
            assistant_id: Some("  ".to_string()),
            ..configured()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::MissingRequired("ASSISTANT__ASSISTANT_ID"))
        );
    }

    #[test]
    fn test_validation_base_url() {
        let config = AssistantConfig {
            base_url: "ftp://example.com".to_string(),
            ..configured()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidBaseUrl));

        let config = AssistantConfig {
            base_url: "http://localhost:9000/v1".to_string(),
            ..configured()
        };
        assert!(config.validate(false).is_ok());
        assert_eq!(config.validate(true), Err(ValidationError::BaseUrlMustBeHttps));
    }

    #[test]
    fn test_validation_timeout_bounds() {
        let config = AssistantConfig {
            timeout_secs: 0,
            ..configured()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(configured().validate(true).is_ok());
    }
}
