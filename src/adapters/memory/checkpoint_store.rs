//! In-memory checkpoint store. Sessions live as long as the process.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::SessionCheckpoint;
use crate::domain::ports::CheckpointStore;

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    sessions: RwLock<HashMap<String, SessionCheckpoint>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, session_id: &str) -> DomainResult<Option<SessionCheckpoint>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, checkpoint: &SessionCheckpoint) -> DomainResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Turn;

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        let mut a = SessionCheckpoint::fresh("a");
        a.begin_question(Turn::user("alpha"));
        store.save("a", &a).await.unwrap();

        assert!(store.load("b").await.unwrap().is_none());
        assert_eq!(store.load("a").await.unwrap(), Some(a));
        assert_eq!(store.len().await, 1);
    }
}
