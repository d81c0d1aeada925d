//! In-process adapters with no external dependencies.

pub mod checkpoint_store;

pub use checkpoint_store::InMemoryCheckpointStore;
