/// Domain models for resumable research sessions.
///
/// A checkpoint carries the whole conversation plus the retrieval state of the
/// question currently being researched. Message history survives across
/// questions; retrieval state is reset whenever a new user turn arrives.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversation::{Conversation, Turn};
use super::evidence::EvidenceSet;

/// Persisted snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Session identifier (unit of isolation)
    pub session_id: String,

    /// Append-only message history
    pub conversation: Conversation,

    /// Standalone retrieval query for the current question
    #[serde(default)]
    pub plan: String,

    /// Evidence gathered for the current question
    #[serde(default)]
    pub evidence: EvidenceSet,

    /// Retrieval rounds executed for the current question
    #[serde(default)]
    pub rounds: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SessionCheckpoint {
    /// Fresh, empty checkpoint. Used when a load misses.
    pub fn fresh(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            conversation: Conversation::new(),
            plan: String::new(),
            evidence: EvidenceSet::new(),
            rounds: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Start a new question: append the user turn, reset retrieval fields.
    pub fn begin_question(&mut self, user_turn: Turn) {
        self.conversation.append(user_turn);
        self.plan.clear();
        self.evidence.clear();
        self.rounds = 0;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
