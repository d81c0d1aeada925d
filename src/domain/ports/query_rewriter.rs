//! Query-rewrite capability port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Turn;

/// Turns the latest question into a standalone retrieval query.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Rewrite `latest` so it can be understood without `history`, resolving
    /// pronouns and ellipsis. May return `latest` verbatim when no rewrite is
    /// needed.
    async fn rewrite(&self, history: &[Turn], latest: &str) -> DomainResult<String>;
}
