//! A single conversation turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::advisor::AdviceSource;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in the session's conversation history.
///
/// `seq` is the logical order of the turn within the session; it keeps
/// increasing across evictions and `clear`, so two turns can always be
/// ordered even when the earlier one has left the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub seq: u64,
    /// For assistant turns: whether the reply came from the rule layer or
    /// the LLM. Absent on user turns.
    pub source: Option<AdviceSource>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub(crate) fn new(role: TurnRole, content: String, seq: u64, source: Option<AdviceSource>) -> Self {
        Self {
            role,
            content,
            seq,
            source,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TurnRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&TurnRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn assistant_turn_carries_source() {
        let turn = Turn::new(
            TurnRole::Assistant,
            "JAMstack".to_string(),
            3,
            Some(AdviceSource::Rule),
        );

        assert_eq!(turn.source, Some(AdviceSource::Rule));
        assert_eq!(turn.seq, 3);
    }
}
