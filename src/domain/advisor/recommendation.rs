//! Advisory outcome types.
//!
//! A run of the pipeline produces either a stack recommendation or a
//! contradiction report. Both are immutable once built and are what the
//! presentation layer renders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::profile::ProfileField;

/// Where an advisory outcome came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    /// Produced by the deterministic rule pre-check.
    Rule,
    /// Produced by the LLM collaborator.
    Llm,
}

impl fmt::Display for AdviceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviceSource::Rule => write!(f, "rule"),
            AdviceSource::Llm => write!(f, "llm"),
        }
    }
}

/// A recommended technology stack with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    stack: Vec<String>,
    rationale: String,
    pros: Vec<String>,
    cons: Vec<String>,
    source: AdviceSource,
}

impl Recommendation {
    pub fn new(
        stack: Vec<String>,
        rationale: impl Into<String>,
        pros: Vec<String>,
        cons: Vec<String>,
        source: AdviceSource,
    ) -> Self {
        Self {
            stack,
            rationale: rationale.into(),
            pros,
            cons,
            source,
        }
    }

    /// Ordered technology names, most significant first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn pros(&self) -> &[String] {
        &self.pros
    }

    pub fn cons(&self) -> &[String] {
        &self.cons
    }

    pub fn source(&self) -> AdviceSource {
        self.source
    }

    /// Re-tags a recommendation with the given source.
    ///
    /// Used when the extractor builds a recommendation from provider output
    /// that does not carry a source of its own.
    pub fn with_source(mut self, source: AdviceSource) -> Self {
        self.source = source;
        self
    }

    /// Single-line rendering used when the outcome is recorded as a
    /// conversation turn.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.stack.join(" + "), self.rationale)
    }
}

/// A detected logical conflict between project inputs.
///
/// Terminal: when the rule layer reports a contradiction the LLM is never
/// invoked and the user is asked to adjust the named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    conflicting_fields: BTreeSet<ProfileField>,
    message: String,
}

impl Contradiction {
    pub fn new(
        conflicting_fields: impl IntoIterator<Item = ProfileField>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            conflicting_fields: conflicting_fields.into_iter().collect(),
            message: message.into(),
        }
    }

    pub fn conflicting_fields(&self) -> &BTreeSet<ProfileField> {
        &self.conflicting_fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .conflicting_fields
            .iter()
            .map(|field| field.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Contradictory input ({}): {}", fields, self.message)
    }
}

/// The result of one advisory run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    Recommendation(Recommendation),
    Contradiction(Contradiction),
}

impl Advice {
    /// Source tag recorded on the assistant turn for this outcome.
    pub fn source(&self) -> AdviceSource {
        match self {
            Advice::Recommendation(rec) => rec.source(),
            // Contradictions only ever come from the rule layer.
            Advice::Contradiction(_) => AdviceSource::Rule,
        }
    }

    /// Text recorded in the conversation window for this outcome.
    pub fn turn_content(&self) -> String {
        match self {
            Advice::Recommendation(rec) => rec.summary(),
            Advice::Contradiction(c) => c.to_string(),
        }
    }
}
