//! Gemini Provider - Implementation of AIProvider for Google's Generative
//! Language API.
//!
//! Talks to the `models/{model}:generateContent` endpoint. The API key is
//! sent via the `x-goog-api-key` header and held in a `Secret` so it never
//! appears in logs or debug output.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-2.0-flash")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let provider = GeminiProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo, TokenUsage,
};

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Builds a provider config from application configuration, or `None`
    /// when no credential is present and the advisor should run rule-only.
    pub fn from_app_config(config: &crate::config::AiConfig) -> Option<Self> {
        if !config.has_credentials() {
            return None;
        }

        let api_key = config.google_api_key.clone().unwrap_or_default();
        Some(
            Self::new(api_key)
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_timeout(config.timeout()),
        )
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Converts our request to Gemini's wire format.
    fn to_gemini_request(&self, request: &CompletionRequest) -> Result<GeminiRequest, AIError> {
        let contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .map(|msg| {
                // Gemini calls the assistant role "model".
                let role = match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                GeminiContent {
                    role: role.to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }
            })
            .collect();

        if contents.is_empty() {
            return Err(AIError::InvalidRequest(
                "request carries no messages".to_string(),
            ));
        }

        let system_instruction = request.system_prompt.as_ref().map(|text| GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text: text.clone() }],
        });

        Ok(GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: Some("application/json".to_string()),
            },
        })
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let gemini_request = self.to_gemini_request(request)?;

        tracing::debug!(
            model = %self.config.model,
            trace_id = %request.metadata.trace_id,
            session_id = %request.metadata.session_id,
            messages = gemini_request.contents.len(),
            "sending Gemini completion request"
        );

        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses onto the port error taxonomy.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 | 404 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Pulls a retry delay out of the error payload, if present.
    fn parse_retry_after(error_body: &str) -> u32 {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(details) = parsed
                .get("error")
                .and_then(|e| e.get("details"))
                .and_then(|d| d.as_array())
            {
                for detail in details {
                    if let Some(delay) = detail.get("retryDelay").and_then(|d| d.as_str()) {
                        if let Ok(secs) = delay.trim_end_matches('s').parse::<u32>() {
                            return secs;
                        }
                    }
                }
            }
        }
        30 // Default retry window
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        if let Some(feedback) = &gemini_response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(AIError::content_filtered(reason.clone()));
            }
        }

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("response contained no candidates"))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            Some(_) => FinishReason::Error,
        };

        let usage = gemini_response
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: gemini_response
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", self.config.model.clone())
    }
}

// Wire types for the Generative Language API.

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::RequestMetadata;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), "trace-1"))
            .with_system_prompt("You advise on tech stacks")
            .with_message(MessageRole::User, "What should I build with?")
            .with_temperature(0.7)
            .with_max_tokens(2048)
    }

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::new("test-key")).unwrap()
    }

    #[test]
    fn config_defaults_match_the_service() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_app_config_requires_credentials() {
        let app = crate::config::AiConfig::default();
        assert!(GeminiConfig::from_app_config(&app).is_none());

        let app = crate::config::AiConfig {
            google_api_key: Some("key".to_string()),
            model: "gemini-2.0-pro".to_string(),
            timeout_secs: 12,
            ..Default::default()
        };
        let config = GeminiConfig::from_app_config(&app).unwrap();
        assert_eq!(config.model, "gemini-2.0-pro");
        assert_eq!(config.timeout, Duration::from_secs(12));
    }

    #[test]
    fn config_debug_does_not_leak_the_key() {
        let config = GeminiConfig::new("super-secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
    }

    #[test]
    fn generate_url_targets_the_model() {
        let p = provider();
        assert_eq!(
            p.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_conversion_maps_assistant_to_model_role() {
        let p = provider();
        let request = test_request().with_message(MessageRole::Assistant, "Try Rails");

        let wire = p.to_gemini_request(&request).unwrap();

        assert_eq!(wire.contents.len(), 2);
        assert_eq!(wire.contents[0].role, "user");
        assert_eq!(wire.contents[1].role, "model");
        assert!(wire.system_instruction.is_some());
        assert_eq!(wire.generation_config.temperature, Some(0.7));
        assert_eq!(wire.generation_config.max_output_tokens, Some(2048));
    }

    #[test]
    fn request_conversion_rejects_empty_messages() {
        let p = provider();
        let request = CompletionRequest::new(RequestMetadata::new(SessionId::new(), "trace-2"));

        let result = p.to_gemini_request(&request);
        assert!(matches!(result, Err(AIError::InvalidRequest(_))));
    }

    #[test]
    fn request_asks_for_json_responses() {
        let p = provider();
        let wire = p.to_gemini_request(&test_request()).unwrap();
        assert_eq!(
            wire.generation_config.response_mime_type.as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn wire_request_serializes_camel_case() {
        let p = provider();
        let wire = p.to_gemini_request(&test_request()).unwrap();
        let json = serde_json::to_string(&wire).unwrap();

        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\""));
        assert!(json.contains("\"responseMimeType\""));
    }

    #[test]
    fn parse_retry_after_reads_retry_delay() {
        let body = r#"{"error": {"code": 429, "details": [{"retryDelay": "12s"}]}}"#;
        assert_eq!(GeminiProvider::parse_retry_after(body), 12);
    }

    #[test]
    fn parse_retry_after_defaults_on_opaque_body() {
        assert_eq!(GeminiProvider::parse_retry_after("quota exceeded"), 30);
    }

    #[test]
    fn provider_info_reports_gemini() {
        let info = provider().provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, "gemini-2.0-flash");
    }

    #[test]
    fn response_deserializes_from_wire_format() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"stack\": [\"Rails\"]}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34, "totalTokenCount": 46},
            "modelVersion": "gemini-2.0-flash"
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.usage_metadata.unwrap().candidates_token_count, 34);
        assert_eq!(parsed.model_version.as_deref(), Some("gemini-2.0-flash"));
    }
}
