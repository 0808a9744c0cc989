//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Google API key. Optional: without it the rule pre-check path stays
    /// fully functional and only the LLM path refuses to run.
    pub google_api_key: Option<String>,

    /// Model to request
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the Generative Language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Generation cap per reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Conversation turns kept as LLM context
    #[serde(default = "default_window_turns")]
    pub window_turns: usize,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if a usable API key is present
    pub fn has_credentials(&self) -> bool {
        self.google_api_key
            .as_ref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Validate AI configuration
    ///
    /// A missing API key is deliberately not a validation failure; the
    /// advisor degrades to rule-only mode without credentials.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.window_turns == 0 {
            return Err(ValidationError::InvalidWindowCapacity);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            window_turns: default_window_turns(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_window_turns() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AiConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.window_turns, 10);
        assert!(!config.has_credentials());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let config = AiConfig {
            timeout_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = AiConfig {
            google_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(!config.has_credentials());
    }

    #[test]
    fn missing_key_still_validates() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let config = AiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn out_of_range_temperature_fails_validation() {
        let config = AiConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTemperature));
    }

    #[test]
    fn zero_window_fails_validation() {
        let config = AiConfig {
            window_turns: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidWindowCapacity)
        );
    }
}
