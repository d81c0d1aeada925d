//! Command-line front end over the research orchestrator.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::errors::ResearchError;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "deepresearch")]
#[command(about = "Multi-hop retrieval research over vector, graph and keyword engines")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .deepresearch/config.yaml + local.yaml)
    #[arg(short, long, global = true, env = "DEEPRESEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .deepresearch/ with a default configuration
    Init(commands::init::InitArgs),
    /// Ask a question in a (new or existing) session
    Ask(commands::ask::AskArgs),
    /// Show a session's conversation, or list recent sessions
    History(commands::history::HistoryArgs),
    /// Regenerate the answer of a session whose synthesis failed
    Retry(commands::retry::RetryArgs),
    /// Index documents into the enabled engines
    Ingest(commands::ingest::IngestArgs),
}

/// Load configuration from `path` or the project defaults.
pub fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let hint = match err.downcast_ref::<ResearchError>() {
        Some(ResearchError::SynthesisFailure { .. }) => {
            Some("Retrieval results were saved; run `deepresearch retry --session <id>` to regenerate.")
        }
        Some(ResearchError::DeadlineExceeded { .. }) => {
            Some("Raise research.session_deadline_secs or check engine latency.")
        }
        _ => None,
    };

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
            "hint": hint,
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
        if let Some(hint) = hint {
            eprintln!("Hint: {hint}");
        }
    }
    std::process::exit(1);
}
