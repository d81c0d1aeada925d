//! Implementation of the `deepresearch ingest` command.
//!
//! Reads a JSON Lines file where each line is
//! `{"content": "...", "metadata": {"source": "..."}}` (`page_content` is
//! accepted as an alias of `content`) and writes it to every enabled engine.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, EngineKind, Metadata, MetadataValue, SearchHit};
use crate::infrastructure::setup::build_stack;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON Lines file of documents
    pub file: PathBuf,

    /// Only index into these engines (defaults to all enabled engines)
    #[arg(long = "engine", value_parser = parse_engine)]
    pub engines: Vec<EngineKind>,
}

fn parse_engine(value: &str) -> Result<EngineKind, String> {
    EngineKind::from_str(value).ok_or_else(|| format!("unknown engine '{value}' (vector, graph, keyword)"))
}

#[derive(Debug, Deserialize)]
struct DocumentLine {
    #[serde(alias = "page_content")]
    content: String,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentLine {
    fn into_hit(self) -> SearchHit {
        let metadata: Metadata = self
            .metadata
            .iter()
            .filter_map(|(k, v)| MetadataValue::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        SearchHit {
            content: self.content,
            metadata,
            score: 0.0,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct EngineIngestResult {
    pub engine: EngineKind,
    pub indexed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct IngestOutput {
    pub documents: usize,
    pub engines: Vec<EngineIngestResult>,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Read {} document(s)", self.documents)];
        for result in &self.engines {
            lines.push(match &result.error {
                Some(error) => format!("  {}: failed ({error})", result.engine),
                None => format!("  {}: indexed {}", result.engine, result.indexed),
            });
        }
        lines.join("\n")
    }
}

/// Parse JSON Lines, skipping blank lines.
fn parse_documents(text: &str) -> Result<Vec<SearchHit>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<DocumentLine>(line)
                .map(DocumentLine::into_hit)
                .with_context(|| format!("Invalid document on line {}", i + 1))
        })
        .filter(|hit| hit.as_ref().map_or(true, |h| !h.content.trim().is_empty()))
        .collect()
}

pub async fn execute(args: IngestArgs, config: &Config, json_mode: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let documents = parse_documents(&text)?;

    let stack = build_stack(config).await?;
    let mut engines = Vec::new();
    for (kind, indexer) in &stack.indexers {
        if !args.engines.is_empty() && !args.engines.contains(kind) {
            continue;
        }
        let result = match indexer.index_documents(&documents).await {
            Ok(indexed) => EngineIngestResult {
                engine: *kind,
                indexed,
                error: None,
            },
            Err(err) => {
                tracing::warn!(engine = %kind, error = %err, "ingest failed for engine");
                EngineIngestResult {
                    engine: *kind,
                    indexed: 0,
                    error: Some(err.to_string()),
                }
            }
        };
        engines.push(result);
    }

    output(
        &IngestOutput {
            documents: documents.len(),
            engines,
        },
        json_mode,
    );
    Ok(())
}
