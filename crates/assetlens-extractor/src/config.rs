//! Configuration for the extraction client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the extraction client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Wait between status checks (seconds)
    pub poll_interval_secs: u64,

    /// Status re-checks after the first one before giving up
    pub max_poll_attempts: u32,

    /// Replace the stored model text with the service's normalized model
    pub normalize_model: bool,

    /// Assistant that answers the queries
    pub assistant_id: String,

    /// Optional project scope for the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Secret name holding the API key
    pub api_key_secret: String,
}

impl ExtractorConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_poll_attempts == 0 {
            return Err("max_poll_attempts must be greater than 0".to_string());
        }
        if self.api_key_secret.is_empty() {
            return Err("api_key_secret must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2,
            max_poll_attempts: 10,
            normalize_model: false,
            assistant_id: String::new(),
            project: None,
            api_key_secret: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_poll_attempts, 10);
    }

    #[test]
    fn test_invalid_poll_attempts() {
        let config = ExtractorConfig {
            max_poll_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
