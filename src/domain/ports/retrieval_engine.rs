//! Retrieval engine port.
//!
//! Every search backend (vector similarity, graph traversal, keyword match,
//! or anything added later) is consumed only through this capability.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::SearchHit;

/// Uniform search capability implemented by each engine adapter.
///
/// Implementations must be safe to call concurrently, both from independent
/// sessions and alongside the other engines of one round.
#[async_trait]
pub trait RetrievalEngine: Send + Sync {
    /// Adapter name for logs (e.g. "qdrant", "neo4j", "sqlite-fts5").
    fn name(&self) -> &'static str;

    /// Search for at most `limit` hits, best first.
    ///
    /// # Returns
    /// - `Ok(vec![])` when the backend legitimately has nothing to return
    ///
    /// # Errors
    /// Returns `DomainError::BackendUnavailable` when the backend cannot be
    /// reached or fails; callers decide whether to isolate or propagate.
    async fn search(&self, query: &str, limit: usize) -> DomainResult<Vec<SearchHit>>;
}

/// Write side of an engine: adds documents to the backend's index so later
/// searches can find them.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Index `documents`, returning how many were written.
    async fn index_documents(&self, documents: &[SearchHit]) -> DomainResult<usize>;
}
