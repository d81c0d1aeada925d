//! Synthesis capability port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Document, Turn};

/// Generates the final answer from the conversation and gathered evidence.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn generate(&self, history: &[Turn], evidence: &[Document]) -> DomainResult<String>;
}
