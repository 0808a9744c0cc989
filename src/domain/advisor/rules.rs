//! Deterministic rule pre-checks.
//!
//! The rule table is an explicit ordered list of named checks; the first rule
//! whose predicate matches wins, and contradiction rules are listed ahead of
//! affirmative ones. Evaluation is a pure function over a validated profile:
//! no side effects, no external calls, and `None` means "defer to the LLM".

use once_cell::sync::Lazy;

use super::profile::{Budget, ProfileField, ProjectProfile, Scalability, Timeline};
use super::recommendation::{AdviceSource, Contradiction, Recommendation};

/// Outcome of a single rule firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Recommendation(Recommendation),
    Contradiction(Contradiction),
}

/// A named predicate/outcome pair in the rule table.
pub struct Rule {
    name: &'static str,
    check: fn(&ProjectProfile) -> Option<RuleOutcome>,
}

impl Rule {
    pub fn new(name: &'static str, check: fn(&ProjectProfile) -> Option<RuleOutcome>) -> Self {
        Self { name, check }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Result of evaluating the rule table: which rule fired and what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub outcome: RuleOutcome,
}

/// An ordered, first-match-wins rule table.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Runs the table in order and returns the first match, if any.
    pub fn evaluate(&self, profile: &ProjectProfile) -> Option<RuleMatch> {
        self.rules.iter().find_map(|rule| {
            (rule.check)(profile).map(|outcome| RuleMatch {
                rule: rule.name,
                outcome,
            })
        })
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    /// The built-in rule table.
    pub fn builtin() -> &'static RuleSet {
        static BUILTIN: Lazy<RuleSet> = Lazy::new(|| {
            RuleSet::new(vec![
                Rule::new("scalability-without-backend", scalability_without_backend),
                Rule::new("scope-over-capacity", scope_over_capacity),
                Rule::new("static-site", static_site),
            ])
        });
        &BUILTIN
    }
}

/// Description phrases that state the project should not have a backend.
const NO_BACKEND_PHRASES: [&str; 3] = ["no backend", "frontend only", "front-end only"];

/// Description phrases that mark the project as static content.
const STATIC_SITE_PHRASES: [&str; 4] = ["static site", "brochure", "portfolio", "landing page"];

/// Description phrases that mark the project as large and complex.
const COMPLEX_SCOPE_PHRASES: [&str; 3] = [
    "enterprise system",
    "large scale platform",
    "many complex features",
];

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| haystack.contains(phrase))
}

/// High scalability paired with an explicit no-backend intent.
fn scalability_without_backend(profile: &ProjectProfile) -> Option<RuleOutcome> {
    let description = profile.description().to_lowercase();

    if profile.scalability() == Scalability::High && contains_any(&description, &NO_BACKEND_PHRASES)
    {
        return Some(RuleOutcome::Contradiction(Contradiction::new(
            [ProfileField::Scalability, ProfileField::Description],
            "High scalability typically requires a robust backend. Clarify whether a \
             backend is in scope or adjust the scalability expectation.",
        )));
    }

    None
}

/// Complex scope against a short timeline with thin budget or skills.
fn scope_over_capacity(profile: &ProjectProfile) -> Option<RuleOutcome> {
    let description = profile.description().to_lowercase();

    if !contains_any(&description, &COMPLEX_SCOPE_PHRASES)
        || profile.timeline() != Timeline::Short
    {
        return None;
    }

    let mut fields = vec![ProfileField::Description, ProfileField::Timeline];
    if profile.budget() == Budget::Low {
        fields.push(ProfileField::Budget);
    }
    if profile.team_skills().is_empty() {
        fields.push(ProfileField::TeamSkills);
    }

    // Timeline pressure alone is not a contradiction; budget or skills must
    // also be thin.
    if fields.len() == 2 {
        return None;
    }

    Some(RuleOutcome::Contradiction(Contradiction::new(
        fields,
        "A complex project on a short timeline with limited budget or expertise is \
         unrealistic. Adjust the scope, timeline, or budget.",
    )))
}

/// Static content with low scalability gets a JAMstack-style stack.
fn static_site(profile: &ProjectProfile) -> Option<RuleOutcome> {
    let description = profile.description().to_lowercase();

    if profile.scalability() != Scalability::Low
        || !contains_any(&description, &STATIC_SITE_PHRASES)
    {
        return None;
    }

    Some(RuleOutcome::Recommendation(Recommendation::new(
        vec![
            "Static site generator (Astro, Eleventy, or Hugo)".to_string(),
            "CDN hosting (Netlify, Vercel, or GitHub Pages)".to_string(),
        ],
        "For simple static content with low scalability needs, a JAMstack setup gives \
         the best performance, security, and hosting cost.",
        vec![
            "Excellent performance".to_string(),
            "High security".to_string(),
            "Low hosting costs".to_string(),
            "Good developer experience".to_string(),
        ],
        vec![
            "Dynamic server-side logic needs workarounds such as serverless functions".to_string(),
            "Build times grow for very large sites".to_string(),
        ],
        AdviceSource::Rule,
    )))
}
