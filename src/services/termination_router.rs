//! Termination routing after each retrieval round.

use crate::domain::models::{ResearchConfig, ResearchPhase};

/// Thresholds deciding whether to run another round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    /// Keep researching while evidence is below this count
    pub min_evidence: usize,
    /// Never run more rounds than this (at least 1)
    pub max_rounds: u32,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::new(2, 3)
    }
}

impl TerminationPolicy {
    /// The first round always runs, so `max_rounds` is clamped to at least 1.
    pub fn new(min_evidence: usize, max_rounds: u32) -> Self {
        Self {
            min_evidence,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.min_evidence, config.max_rounds)
    }

    /// Pure routing decision: `Researching` while evidence is insufficient
    /// and the round cap is not reached, otherwise `Generating`.
    pub const fn route(&self, evidence: usize, rounds: u32) -> ResearchPhase {
        if evidence < self.min_evidence && rounds < self.max_rounds {
            ResearchPhase::Researching
        } else {
            ResearchPhase::Generating
        }
    }
}
