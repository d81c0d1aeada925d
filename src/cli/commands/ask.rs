//! Implementation of the `deepresearch ask` command.

use anyhow::{bail, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, Document, SessionOutcome};
use crate::infrastructure::setup::build_stack;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to research
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Session to continue (a new one is started when omitted)
    #[arg(long, short)]
    pub session: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct SourceOutput {
    pub engine: String,
    pub source: Option<String>,
    pub score: f64,
    pub excerpt: String,
}

impl SourceOutput {
    fn from_document(doc: &Document) -> Self {
        Self {
            engine: doc.origin_engine.to_string(),
            source: doc.source().map(str::to_string),
            score: doc.score,
            excerpt: truncate(&doc.content, 160),
        }
    }
}

/// Answer plus the evidence and reasoning behind it.
#[derive(Debug, serde::Serialize)]
pub struct AnswerOutput {
    pub session_id: String,
    pub answer: String,
    pub rounds_used: u32,
    pub sources: Vec<SourceOutput>,
    pub reasoning_logs: Vec<String>,
}

impl From<&SessionOutcome> for AnswerOutput {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            session_id: outcome.session_id.clone(),
            answer: outcome.answer.clone(),
            rounds_used: outcome.rounds_used,
            sources: outcome.evidence.iter().map(SourceOutput::from_document).collect(),
            reasoning_logs: outcome.reasoning_log(),
        }
    }
}

impl CommandOutput for AnswerOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.answer.clone(), String::new()];
        lines.push(format!(
            "Sources ({} after {} round(s)):",
            self.sources.len(),
            self.rounds_used
        ));
        for (i, source) in self.sources.iter().enumerate() {
            lines.push(format!(
                "  [{}] {} via {} ({:.3}): {}",
                i + 1,
                source.source.as_deref().unwrap_or("unknown"),
                source.engine,
                source.score,
                source.excerpt
            ));
        }
        lines.push(format!("\nSession: {}", self.session_id));
        lines.join("\n")
    }
}

pub async fn execute(args: AskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        bail!("Question cannot be empty");
    }
    let session_id = args.session.unwrap_or_else(|| Uuid::new_v4().to_string());

    let stack = build_stack(config).await?;
    let outcome = stack.orchestrator.run_session(&session_id, &question).await?;

    output(&AnswerOutput::from(&outcome), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EngineKind, SearchHit};

    #[test]
    fn test_answer_output_lists_sources() {
        let outcome = SessionOutcome {
            session_id: "s1".to_string(),
            answer: "Helmets are mandatory.".to_string(),
            evidence: vec![Document::from_hit(
                SearchHit::new("Riders must wear helmets.", 0.9).with_metadata("source", "act.pdf"),
                EngineKind::Vector,
            )],
            rounds_used: 1,
            plan: "helmet rules".to_string(),
            rounds: vec![],
            trace: vec![],
        };

        let human = AnswerOutput::from(&outcome).to_human();
        assert!(human.starts_with("Helmets are mandatory."));
        assert!(human.contains("[1] act.pdf via vector"));

        let json = AnswerOutput::from(&outcome).to_json();
        assert_eq!(json["sources"][0]["engine"], "vector");
        assert_eq!(json["reasoning_logs"].as_array().map(Vec::len), Some(4));
    }
}
