//! Structured parsing of LLM replies.
//!
//! Provider output is supposed to be a single JSON object matching the
//! `{stack, rationale, pros, cons}` schema, but real replies wrap it in
//! markdown fences or conversational framing. The extractor locates the JSON
//! payload, parses it through serde, and rejects schema violations with a
//! reason the orchestrator can feed back as a corrective instruction.

use serde::Deserialize;
use thiserror::Error;

use super::recommendation::{AdviceSource, Recommendation};

/// Errors that can occur while extracting a recommendation from a reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No JSON payload found in response")]
    NoJsonPayload,

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Missing or empty required field: {0}")]
    MissingField(&'static str),
}

/// Wire shape of a structured recommendation reply.
#[derive(Debug, Deserialize)]
struct RecommendationPayload {
    stack: Vec<String>,
    rationale: String,
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
}

/// Extracts schema-conforming recommendations from raw provider replies.
#[derive(Debug, Clone, Default)]
pub struct ResponseExtractor;

impl ResponseExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parses a reply into a `Recommendation` tagged with the LLM source.
    pub fn extract(&self, response: &str) -> Result<Recommendation, ExtractionError> {
        let json_str = self.locate_json(response)?;

        let value: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| ExtractionError::ParseError(e.to_string()))?;

        // Tolerate a reply wrapped in a one-element array.
        let object = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or(ExtractionError::NoJsonPayload)?,
            other => other,
        };

        let payload: RecommendationPayload = serde_json::from_value(object)
            .map_err(|e| ExtractionError::ParseError(e.to_string()))?;

        if payload.stack.iter().all(|item| item.trim().is_empty()) {
            return Err(ExtractionError::MissingField("stack"));
        }
        if payload.rationale.trim().is_empty() {
            return Err(ExtractionError::MissingField("rationale"));
        }

        Ok(Recommendation::new(
            payload.stack,
            payload.rationale,
            payload.pros,
            payload.cons,
            AdviceSource::Llm,
        ))
    }

    /// Locates the JSON payload inside a reply that may contain markdown
    /// code fences or conversational text around it.
    fn locate_json(&self, response: &str) -> Result<String, ExtractionError> {
        let trimmed = response.trim();

        if let Some(json) = self.extract_from_code_block(trimmed) {
            return Ok(json);
        }

        let obj_start = trimmed.find('{');
        let arr_start = trimmed.find('[');

        let (start, open, close) = match (obj_start, arr_start) {
            (Some(o), Some(a)) if a < o => (a, '[', ']'),
            (Some(o), _) => (o, '{', '}'),
            (None, Some(a)) => (a, '[', ']'),
            (None, None) => return Err(ExtractionError::NoJsonPayload),
        };

        self.extract_balanced_json(trimmed, start, open, close)
            .ok_or(ExtractionError::NoJsonPayload)
    }

    fn extract_from_code_block(&self, s: &str) -> Option<String> {
        let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

        for pattern in patterns {
            if let Some(start) = s.find(pattern) {
                let json_start = start + pattern.len();
                if let Some(end) = s[json_start..].find("```") {
                    return Some(s[json_start..json_start + end].trim().to_string());
                }
            }
        }
        None
    }

    fn extract_balanced_json(
        &self,
        s: &str,
        start: usize,
        open: char,
        close: char,
    ) -> Option<String> {
        let mut depth = 0;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, c) in s[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                _ if in_string => {}
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(s[start..start + i + c.len_utf8()].to_string());
                    }
                }
                _ => {}
            }
        }
        None
    }
}
