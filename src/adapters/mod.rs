//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod engines;
pub mod llm;
pub mod memory;
pub mod sqlite;
