//! Embedding provider port for semantic vector generation.
//!
//! The provider is built once at startup and shared read-only (behind an
//! `Arc`) with every component that needs it.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;
}
