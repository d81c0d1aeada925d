/// Checkpoint store port (trait) for session persistence.
///
/// Services depend on this trait, not on a concrete database.
use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::SessionCheckpoint;

/// Repository trait for session checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the checkpoint for a session
    ///
    /// # Returns
    /// - `Some(SessionCheckpoint)` if found
    /// - `None` if the session has never been saved
    ///
    /// # Errors
    /// Returns error if the store is unreachable or the snapshot cannot be decoded
    async fn load(&self, session_id: &str) -> DomainResult<Option<SessionCheckpoint>>;

    /// Saves (inserts or replaces) the checkpoint for a session
    async fn save(&self, session_id: &str, checkpoint: &SessionCheckpoint) -> DomainResult<()>;
}
