//! Domain layer for the deepresearch orchestrator
//!
//! This module contains core models, error taxonomy and port traits.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult, ResearchError, ResearchResult};
