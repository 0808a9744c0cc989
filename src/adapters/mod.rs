//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - LLM provider implementations (Gemini, mock)

pub mod ai;

pub use ai::{GeminiConfig, GeminiProvider, MockAIProvider, MockError, MockResponse};
