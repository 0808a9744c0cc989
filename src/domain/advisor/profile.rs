//! Project profile - the validated input model for an advisory run.
//!
//! A profile is rebuilt from the presentation form on every submission and is
//! only constructible through [`ProjectProfile::new`], so downstream code
//! never sees a half-filled or empty-description profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Kind of application the user is building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    Web,
    Mobile,
    Api,
    Desktop,
    Other,
}

/// Project budget band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Low,
    Medium,
    High,
}

/// Delivery timeline band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Short,
    Medium,
    Long,
}

/// Expected scalability need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalability {
    Low,
    Medium,
    High,
}

/// Names of the profile fields, used when a contradiction reports which
/// inputs conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Description,
    AppType,
    TeamSkills,
    Budget,
    Timeline,
    Scalability,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileField::Description => "description",
            ProfileField::AppType => "app_type",
            ProfileField::TeamSkills => "team_skills",
            ProfileField::Budget => "budget",
            ProfileField::Timeline => "timeline",
            ProfileField::Scalability => "scalability",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppType::Web => "web",
            AppType::Mobile => "mobile",
            AppType::Api => "api",
            AppType::Desktop => "desktop",
            AppType::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Budget::Low => "low",
            Budget::Medium => "medium",
            Budget::High => "high",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeline::Short => "short",
            Timeline::Medium => "medium",
            Timeline::Long => "long",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Scalability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scalability::Low => "low",
            Scalability::Medium => "medium",
            Scalability::High => "high",
        };
        write!(f, "{}", name)
    }
}

/// Validated description of the project under discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    description: String,
    app_type: AppType,
    team_skills: BTreeSet<String>,
    budget: Budget,
    timeline: Timeline,
    scalability: Scalability,
}

impl ProjectProfile {
    /// Builds a profile, rejecting an empty or whitespace-only description
    /// and blank skill entries.
    pub fn new(
        description: impl Into<String>,
        app_type: AppType,
        team_skills: impl IntoIterator<Item = String>,
        budget: Budget,
        timeline: Timeline,
        scalability: Scalability,
    ) -> Result<Self, ValidationError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ValidationError::empty_field("description"));
        }

        let mut skills = BTreeSet::new();
        for skill in team_skills {
            if skill.trim().is_empty() {
                return Err(ValidationError::invalid_format(
                    "team_skills",
                    "blank skill entry",
                ));
            }
            skills.insert(skill);
        }

        Ok(Self {
            description,
            app_type,
            team_skills: skills,
            budget,
            timeline,
            scalability,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn app_type(&self) -> AppType {
        self.app_type
    }

    pub fn team_skills(&self) -> &BTreeSet<String> {
        &self.team_skills
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn scalability(&self) -> Scalability {
        self.scalability
    }

    /// True if any team skill matches `name` case-insensitively.
    pub fn has_skill(&self, name: &str) -> bool {
        self.team_skills
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name))
    }

    /// Renders the profile as the human-readable context block embedded in
    /// LLM requests.
    pub fn context_lines(&self) -> String {
        let skills = if self.team_skills.is_empty() {
            "none".to_string()
        } else {
            self.team_skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "- Project description: {}\n\
             - Application type: {}\n\
             - Team skills: {}\n\
             - Budget: {}\n\
             - Timeline: {}\n\
             - Scalability needs: {}",
            self.description, self.app_type, skills, self.budget, self.timeline, self.scalability
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ProjectProfile {
        ProjectProfile::new(
            "A marketplace for vintage synthesizers",
            AppType::Web,
            vec!["Rust".to_string(), "React".to_string()],
            Budget::Medium,
            Timeline::Medium,
            Scalability::Medium,
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_description() {
        let result = ProjectProfile::new(
            "   ",
            AppType::Web,
            vec![],
            Budget::Low,
            Timeline::Short,
            Scalability::Low,
        );

        assert!(matches!(result, Err(ValidationError::EmptyField { .. })));
    }

    #[test]
    fn rejects_blank_skill_entry() {
        let result = ProjectProfile::new(
            "Internal tooling",
            AppType::Api,
            vec!["Go".to_string(), "  ".to_string()],
            Budget::Low,
            Timeline::Short,
            Scalability::Low,
        );

        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn deduplicates_skills() {
        let p = ProjectProfile::new(
            "Internal tooling",
            AppType::Api,
            vec!["Go".to_string(), "Go".to_string()],
            Budget::Low,
            Timeline::Short,
            Scalability::Low,
        )
        .unwrap();

        assert_eq!(p.team_skills().len(), 1);
    }

    #[test]
    fn has_skill_is_case_insensitive() {
        let p = profile();
        assert!(p.has_skill("rust"));
        assert!(p.has_skill("REACT"));
        assert!(!p.has_skill("cobol"));
    }

    #[test]
    fn serde_round_trip_preserves_all_fields() {
        let p = profile();
        let json = serde_json::to_string(&p).unwrap();
        let back: ProjectProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&AppType::Web).unwrap(), "\"web\"");
        assert_eq!(
            serde_json::to_string(&Scalability::High).unwrap(),
            "\"high\""
        );
        assert_eq!(
            serde_json::to_string(&ProfileField::TeamSkills).unwrap(),
            "\"team_skills\""
        );
    }

    #[test]
    fn context_lines_mention_every_field() {
        let text = profile().context_lines();
        assert!(text.contains("vintage synthesizers"));
        assert!(text.contains("Application type: web"));
        assert!(text.contains("Rust, React"));
        assert!(text.contains("Budget: medium"));
        assert!(text.contains("Timeline: medium"));
        assert!(text.contains("Scalability needs: medium"));
    }

    #[test]
    fn context_lines_show_none_for_empty_skills() {
        let p = ProjectProfile::new(
            "Side project",
            AppType::Other,
            vec![],
            Budget::Low,
            Timeline::Short,
            Scalability::Low,
        )
        .unwrap();

        assert!(p.context_lines().contains("Team skills: none"));
    }
}
