//! deepresearch - multi-hop retrieval research orchestrator
//!
//! Answers questions inside conversational sessions by looping over
//! heterogeneous retrieval engines until enough distinct evidence is gathered,
//! then synthesizing a grounded answer.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, error taxonomy and port traits
//! - **Service Layer** (`services`): planner, fan-out retriever, termination
//!   policy and the research state machine
//! - **Adapters** (`adapters`): Qdrant, Neo4j, SQLite FTS5, OpenAI-compatible
//!   chat/embeddings, checkpoint stores
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use deepresearch::infrastructure::{config::ConfigLoader, setup::build_stack};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let stack = build_stack(&config).await?;
//!     let outcome = stack.orchestrator.run_session("s1", "Is a helmet required?").await?;
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, Conversation, Document, EngineKind, EvidenceSet, ResearchPhase, SearchHit,
    SessionCheckpoint, SessionOutcome, Turn,
};
pub use domain::ports::{CheckpointStore, QueryRewriter, RetrievalEngine, Synthesizer};
pub use domain::{DomainError, DomainResult, ResearchError, ResearchResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{FanOutRetriever, QueryPlanner, ResearchOrchestrator, TerminationPolicy};
