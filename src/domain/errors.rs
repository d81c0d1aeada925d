//! Domain errors for the deepresearch orchestrator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::models::{Document, EngineKind};

/// Errors raised by ports and their adapters.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A retrieval engine failed, timed out or is unreachable.
    #[error("Retrieval engine {engine} unavailable: {reason}")]
    BackendUnavailable { engine: EngineKind, reason: String },

    #[error("Query rewrite failed: {0}")]
    RewriteFailed(String),

    #[error("Answer synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl DomainError {
    /// Shorthand for a [`DomainError::BackendUnavailable`].
    pub fn unavailable(engine: EngineKind, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            engine,
            reason: reason.into(),
        }
    }

    /// Whether this error is a recoverable engine outage.
    pub const fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Fatal errors surfaced at the `run_session` boundary.
///
/// Engine outages never appear here: they are absorbed while researching.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("No user turn supplied")]
    EmptyConversation,

    #[error("Planning failed: {0}")]
    Planning(#[source] DomainError),

    /// Generation failed after retrieval completed. The gathered evidence is
    /// returned so the caller can retry generation without re-retrieving.
    #[error("Synthesis failed after {rounds_used} round(s): {source}")]
    SynthesisFailure {
        #[source]
        source: DomainError,
        evidence: Vec<Document>,
        rounds_used: u32,
    },

    #[error("Session deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    #[error("Checkpoint store error: {0}")]
    Checkpoint(#[source] DomainError),

    #[error("Session {0} has no unanswered question to regenerate")]
    NothingToRegenerate(String),
}

pub type ResearchResult<T> = Result<T, ResearchError>;
