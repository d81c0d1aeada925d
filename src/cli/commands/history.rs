//! Implementation of the `deepresearch history` command.

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::sqlite::{database_url, initialize_database, SqliteCheckpointStore};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Turn};
use crate::domain::ports::CheckpointStore;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Session to show; lists recent sessions when omitted
    #[arg(long, short)]
    pub session: Option<String>,

    /// Maximum sessions to list
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct ConversationOutput {
    pub session_id: String,
    pub turns: Vec<Turn>,
    pub awaiting_answer: bool,
}

impl CommandOutput for ConversationOutput {
    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .turns
            .iter()
            .map(|turn| {
                format!(
                    "[{}] {}: {}",
                    turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    turn.role.label(),
                    turn.content
                )
            })
            .collect();
        if self.awaiting_answer {
            lines.push("(last question has no answer yet; see `deepresearch retry`)".to_string());
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionListOutput {
    pub sessions: Vec<String>,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        if self.sessions.is_empty() {
            "No sessions yet.".to_string()
        } else {
            self.sessions.join("\n")
        }
    }
}

pub async fn execute(args: HistoryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = initialize_database(&database_url(&config.database.path), None)
        .await
        .context("Failed to open checkpoint database")?;
    let store = SqliteCheckpointStore::new(pool);

    let Some(session_id) = args.session else {
        let sessions = store.list_sessions(args.limit).await?;
        output(&SessionListOutput { sessions }, json_mode);
        return Ok(());
    };

    let checkpoint = store
        .load(&session_id)
        .await?
        .with_context(|| format!("Session {session_id} not found"))?;

    let output_data = ConversationOutput {
        session_id,
        awaiting_answer: checkpoint.conversation.awaiting_answer(),
        turns: checkpoint.conversation.turns().to_vec(),
    };
    output(&output_data, json_mode);
    Ok(())
}
