//! AI Provider Adapters
//!
//! Implementations of the AIProvider port:
//!
//! - **GeminiProvider** - Google Generative Language API over HTTP
//! - **MockAIProvider** - Scripted responses for tests

mod gemini_provider;
mod mock_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
