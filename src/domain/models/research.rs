//! Research state machine phases and session outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::document::{Document, EngineKind};

/// State tag of the research machine.
///
/// `Planning -> Researching -> Reviewing -> {Researching | Generating} -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchPhase {
    Planning,
    Researching,
    Reviewing,
    Generating,
    Done,
}

impl ResearchPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Researching => "researching",
            Self::Reviewing => "reviewing",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one Researching step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// 1-based round number
    pub round: u32,
    /// Documents returned by all engines before dedup
    pub retrieved: usize,
    /// Documents new to the evidence set
    pub fresh: usize,
    /// Engines that failed or timed out this round
    pub failed_engines: Vec<EngineKind>,
}

/// One entry of the reasoning trace: a phase the machine passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: ResearchPhase,
    /// Rounds completed when the phase was entered
    pub round: u32,
    /// Evidence size when the phase was entered
    pub evidence: usize,
}

/// Result of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub answer: String,
    pub evidence: Vec<Document>,
    pub rounds_used: u32,
    /// Standalone query that drove retrieval
    pub plan: String,
    #[serde(default)]
    pub rounds: Vec<RoundReport>,
    #[serde(default)]
    pub trace: Vec<PhaseRecord>,
}

impl SessionOutcome {
    /// Human-readable reasoning log lines.
    pub fn reasoning_log(&self) -> Vec<String> {
        vec![
            format!("Planner: {}", self.plan),
            format!("Researcher: {} retrieval round(s)", self.rounds_used),
            format!("Reviewer: {} document(s) collected", self.evidence.len()),
            "Generator: answer synthesized".to_string(),
        ]
    }
}
