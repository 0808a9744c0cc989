//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `STACK_ADVISOR`
//! prefix and `__` as the section separator; the Google API key additionally
//! falls back to the plain `GOOGLE_API_KEY` variable.
//!
//! # Example
//!
//! ```no_run
//! use stack_advisor::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// AI provider configuration (Gemini)
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `STACK_ADVISOR` prefix,
    ///    e.g. `STACK_ADVISOR__AI__MODEL=gemini-2.0-flash`
    /// 3. Falls back to `GOOGLE_API_KEY` for the provider key, matching the
    ///    variable the hosted advisor has always used
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types. A missing API key is not an error here.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STACK_ADVISOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if config.ai.google_api_key.is_none() {
            config.ai.google_api_key = std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("STACK_ADVISOR__AI__GOOGLE_API_KEY");
        env::remove_var("STACK_ADVISOR__AI__MODEL");
        env::remove_var("STACK_ADVISOR__AI__TIMEOUT_SECS");
        env::remove_var("GOOGLE_API_KEY");
    }

    #[test]
    fn loads_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load().unwrap();

        assert!(config.ai.google_api_key.is_none());
        assert_eq!(config.ai.model, "gemini-2.0-flash");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_prefixed_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("STACK_ADVISOR__AI__GOOGLE_API_KEY", "prefixed-key");
        env::set_var("STACK_ADVISOR__AI__MODEL", "gemini-2.0-pro");

        let config = AppConfig::load().unwrap();
        clear_env();

        assert_eq!(config.ai.google_api_key.as_deref(), Some("prefixed-key"));
        assert_eq!(config.ai.model, "gemini-2.0-pro");
    }

    #[test]
    fn falls_back_to_plain_google_api_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("GOOGLE_API_KEY", "plain-key");

        let config = AppConfig::load().unwrap();
        clear_env();

        assert_eq!(config.ai.google_api_key.as_deref(), Some("plain-key"));
        assert!(config.ai.has_credentials());
    }

    #[test]
    fn prefixed_key_wins_over_fallback() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("STACK_ADVISOR__AI__GOOGLE_API_KEY", "prefixed-key");
        env::set_var("GOOGLE_API_KEY", "plain-key");

        let config = AppConfig::load().unwrap();
        clear_env();

        assert_eq!(config.ai.google_api_key.as_deref(), Some("prefixed-key"));
    }
}
