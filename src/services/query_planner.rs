//! Query planning: derive the standalone retrieval query for a question.
//!
//! The plan is computed once per question and reused by every round; later
//! rounds re-run the same query rather than re-planning.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Conversation;
use crate::domain::ports::QueryRewriter;

pub struct QueryPlanner {
    rewriter: Arc<dyn QueryRewriter>,
}

impl QueryPlanner {
    pub fn new(rewriter: Arc<dyn QueryRewriter>) -> Self {
        Self { rewriter }
    }

    /// Produce a non-empty retrieval plan for the latest turn.
    ///
    /// A single-turn conversation has no context to resolve, so its text is
    /// used as-is and the rewriter is not called.
    pub async fn plan(&self, conversation: &Conversation) -> DomainResult<String> {
        let latest = conversation
            .latest()
            .ok_or_else(|| DomainError::ValidationFailed("conversation has no turns".to_string()))?;

        if conversation.len() == 1 {
            debug!("single-turn conversation; using question verbatim");
            return Ok(latest.content.clone());
        }

        let rewritten = self
            .rewriter
            .rewrite(conversation.prior(), &latest.content)
            .await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            warn!("rewriter returned an empty query; falling back to the original question");
            return Ok(latest.content.clone());
        }

        info!(original = %latest.content, rewritten = %rewritten, "query rewritten");
        Ok(rewritten.to_string())
    }
}
