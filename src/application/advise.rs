//! AdviseHandler - run one advisory turn for a session.
//!
//! Composes the rule pre-check, the conversation window and the LLM
//! collaborator into a single decision: rule hits short-circuit before any
//! network traffic, everything else becomes one provider call with at most
//! one corrective parse retry. All failures surface as typed errors; none
//! escape as panics.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::advisor::{
    Advice, AdviceSource, ExtractionError, ProjectProfile, ResponseExtractor, RuleOutcome, RuleSet,
};
use crate::domain::conversation::{ConversationWindow, TurnRole};
use crate::domain::foundation::ValidationError;
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata};

/// Fixed system instruction sent with every LLM request.
const SYSTEM_INSTRUCTION: &str = "You are an expert tech stack advisor. Analyze the user's \
project requirements and recommend one suitable technology stack, taking the conversation \
history into account for follow-up questions. Respond with a single JSON object and nothing \
else, using exactly these keys: \"stack\" (array of technology names, most significant \
first), \"rationale\" (string explaining the fit against the stated inputs), \"pros\" (array \
of strings), \"cons\" (array of strings).";

/// Error type for an advisory run.
#[derive(Debug, thiserror::Error)]
pub enum AdviseError {
    /// Bad or missing input model fields.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// No provider credential configured; only rule-based advice works.
    #[error("no LLM credential configured; rule-based checks remain available")]
    MissingCredential,

    /// The provider call timed out.
    #[error("LLM request timed out after {timeout_secs}s")]
    LlmTimeout { timeout_secs: u32 },

    /// The provider failed (rate limit, auth, network, ...).
    #[error("LLM provider error: {0}")]
    LlmProvider(#[source] AIError),

    /// The reply stayed unparseable after the corrective retry. `raw_text`
    /// carries the degraded text-only response to show instead of the
    /// structured fields.
    #[error("LLM reply could not be parsed as a recommendation: {reason}")]
    RecommendationParse { reason: String, raw_text: String },
}

impl From<AIError> for AdviseError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::Timeout { timeout_secs } => AdviseError::LlmTimeout { timeout_secs },
            other => AdviseError::LlmProvider(other),
        }
    }
}

/// Handler for advisory runs.
///
/// Holds no session state: the conversation window is passed in by the
/// session that owns it, so concurrent sessions are isolated by
/// construction.
pub struct AdviseHandler<P: ?Sized + AIProvider> {
    provider: Option<Arc<P>>,
    rules: &'static RuleSet,
    extractor: ResponseExtractor,
    temperature: f32,
    max_tokens: u32,
}

impl<P: ?Sized + AIProvider> AdviseHandler<P> {
    /// Creates a handler. `provider` is `None` when no credential is
    /// configured; the rule path keeps working and the LLM path fails fast.
    pub fn new(provider: Option<Arc<P>>) -> Self {
        Self {
            provider,
            rules: RuleSet::builtin(),
            extractor: ResponseExtractor::new(),
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    /// Swaps in a different rule table.
    pub fn with_rules(mut self, rules: &'static RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the sampling temperature for LLM requests.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generation cap for LLM requests.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Runs one advisory turn.
    ///
    /// On success the user message and the assistant reply are appended to
    /// `window` (evicting past its capacity). Credential, timeout and
    /// provider failures leave the window untouched; an unparseable reply
    /// records the raw text so follow-up turns keep context.
    pub async fn advise(
        &self,
        profile: &ProjectProfile,
        query: Option<&str>,
        window: &mut ConversationWindow,
    ) -> Result<Advice, AdviseError> {
        let user_content = Self::user_message(profile, query);

        // Deterministic pre-check first; a hit never reaches the provider.
        if let Some(hit) = self.rules.evaluate(profile) {
            tracing::info!(rule = hit.rule, "rule pre-check short-circuited the LLM");
            let advice = match hit.outcome {
                RuleOutcome::Recommendation(rec) => Advice::Recommendation(rec),
                RuleOutcome::Contradiction(c) => Advice::Contradiction(c),
            };
            window.append_user(user_content);
            window.append_assistant(advice.turn_content(), AdviceSource::Rule);
            return Ok(advice);
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or(AdviseError::MissingCredential)?;

        let request = self.build_request(&user_content, window, None);
        let response = provider.complete(request).await?;

        let (recommendation, raw_reply) = match self.extractor.extract(&response.content) {
            Ok(rec) => (Ok(rec), response.content),
            Err(first_error) => {
                tracing::warn!(
                    error = %first_error,
                    "reply failed extraction, retrying once with corrective instruction"
                );

                let retry = self.build_request(
                    &user_content,
                    window,
                    Some(CorrectiveContext {
                        failed_reply: &response.content,
                        error: &first_error,
                    }),
                );
                let retry_response = provider.complete(retry).await?;

                match self.extractor.extract(&retry_response.content) {
                    Ok(rec) => (Ok(rec), retry_response.content),
                    Err(second_error) => (Err(second_error), retry_response.content),
                }
            }
        };

        match recommendation {
            Ok(rec) => {
                let advice = Advice::Recommendation(rec);
                window.append_user(user_content);
                window.append_assistant(advice.turn_content(), AdviceSource::Llm);
                Ok(advice)
            }
            Err(error) => {
                // Degrade to the raw text rather than dropping the exchange.
                let raw_text = if raw_reply.trim().is_empty() {
                    "The model returned an empty reply.".to_string()
                } else {
                    raw_reply
                };

                window.append_user(user_content);
                window.append_assistant(&raw_text, AdviceSource::Llm);

                Err(AdviseError::RecommendationParse {
                    reason: error.to_string(),
                    raw_text,
                })
            }
        }
    }

    /// Renders the current user message: readable context block, the exact
    /// serialized profile, and the question for this turn.
    pub fn user_message(profile: &ProjectProfile, query: Option<&str>) -> String {
        let profile_json =
            serde_json::to_string_pretty(profile).expect("profile serialization is infallible");

        format!(
            "Project context:\n{}\n\nStructured project input:\n```json\n{}\n```\n\nQuestion: {}",
            profile.context_lines(),
            profile_json,
            query.unwrap_or("Recommend a technology stack for this project."),
        )
    }

    /// Builds the completion request: system instruction, windowed history
    /// oldest-to-newest, current user message, and on retry the failed
    /// reply plus a corrective instruction.
    fn build_request(
        &self,
        user_content: &str,
        window: &ConversationWindow,
        corrective: Option<CorrectiveContext<'_>>,
    ) -> CompletionRequest {
        let metadata = RequestMetadata::new(
            window.session_id(),
            format!("advise-{}", Uuid::new_v4()),
        );

        let mut request = CompletionRequest::new(metadata)
            .with_system_prompt(SYSTEM_INSTRUCTION)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        for turn in window.window() {
            let role = match turn.role {
                TurnRole::User => MessageRole::User,
                TurnRole::Assistant => MessageRole::Assistant,
            };
            request = request.with_message(role, turn.content.clone());
        }

        request = request.with_message(MessageRole::User, user_content);

        if let Some(ctx) = corrective {
            request = request
                .with_message(MessageRole::Assistant, ctx.failed_reply)
                .with_message(
                    MessageRole::User,
                    format!(
                        "That reply could not be used: {}. Respond again with only the JSON \
                         object described in the instructions, with the keys \"stack\", \
                         \"rationale\", \"pros\" and \"cons\".",
                        ctx.error
                    ),
                );
        }

        request
    }
}

/// The failed reply and why it failed, for the corrective retry.
struct CorrectiveContext<'a> {
    failed_reply: &'a str,
    error: &'a ExtractionError,
}
