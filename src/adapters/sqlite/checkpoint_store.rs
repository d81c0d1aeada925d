//! SQLite implementation of the CheckpointStore.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Conversation, EvidenceSet, SessionCheckpoint};
use crate::domain::ports::CheckpointStore;

use super::{parse_datetime, parse_json_or_default};

#[derive(Clone)]
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Known session ids, most recently updated first.
    pub async fn list_sessions(&self, limit: u32) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT session_id FROM session_checkpoints ORDER BY updated_at DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, session_id: &str) -> DomainResult<Option<SessionCheckpoint>> {
        let row: Option<CheckpointRow> = sqlx::query_as(
            "SELECT session_id, conversation, plan, evidence, rounds, created_at, updated_at FROM session_checkpoints WHERE session_id = ?"
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn save(&self, session_id: &str, checkpoint: &SessionCheckpoint) -> DomainResult<()> {
        let conversation_json = serde_json::to_string(&checkpoint.conversation)?;
        let evidence_json = serde_json::to_string(&checkpoint.evidence)?;

        sqlx::query(
            r#"INSERT INTO session_checkpoints (session_id, conversation, plan, evidence, rounds, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET
                   conversation = excluded.conversation,
                   plan = excluded.plan,
                   evidence = excluded.evidence,
                   rounds = excluded.rounds,
                   updated_at = excluded.updated_at"#
        )
        .bind(session_id)
        .bind(&conversation_json)
        .bind(&checkpoint.plan)
        .bind(&evidence_json)
        .bind(i64::from(checkpoint.rounds))
        .bind(timestamp(checkpoint.created_at))
        .bind(timestamp(checkpoint.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Fixed-width RFC3339 so `ORDER BY updated_at` sorts chronologically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(sqlx::FromRow)]
struct CheckpointRow {
    session_id: String,
    conversation: Option<String>,
    plan: String,
    evidence: Option<String>,
    rounds: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CheckpointRow> for SessionCheckpoint {
    type Error = DomainError;

    fn try_from(row: CheckpointRow) -> Result<Self, Self::Error> {
        let conversation: Conversation = parse_json_or_default(row.conversation)?;
        let evidence: EvidenceSet = parse_json_or_default(row.evidence)?;
        let rounds = u32::try_from(row.rounds)
            .map_err(|_| DomainError::SerializationError(format!("Invalid round count: {}", row.rounds)))?;

        Ok(Self {
            session_id: row.session_id,
            conversation,
            plan: row.plan,
            evidence,
            rounds,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
