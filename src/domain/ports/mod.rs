//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - RetrievalEngine / DocumentIndexer: one search backend, read and write side
//! - QueryRewriter: standalone-query rewriting
//! - Synthesizer: grounded answer generation
//! - CheckpointStore: session persistence
//! - EmbeddingProvider: text embeddings for the vector engine

pub mod checkpoint_store;
pub mod embedding;
pub mod query_rewriter;
pub mod retrieval_engine;
pub mod synthesizer;

pub use checkpoint_store::CheckpointStore;
pub use embedding::EmbeddingProvider;
pub use query_rewriter::QueryRewriter;
pub use retrieval_engine::{DocumentIndexer, RetrievalEngine};
pub use synthesizer::Synthesizer;
