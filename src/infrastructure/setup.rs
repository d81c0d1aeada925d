//! Project initialization and dependency wiring
//!
//! Handles:
//! - Configuration directory and default config file creation
//! - Building the research stack (stores, engines, capabilities) from `Config`

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::embeddings::OpenAiEmbeddingProvider;
use crate::adapters::engines::{Neo4jGraphEngine, QdrantVectorEngine, SqliteKeywordEngine};
use crate::adapters::llm::OpenAiChatClient;
use crate::adapters::sqlite::{database_url, initialize_database, PoolConfig, SqliteCheckpointStore};
use crate::domain::models::{Config, EngineKind};
use crate::domain::ports::{DocumentIndexer, RetrievalEngine};
use crate::services::{FanOutRetriever, QueryPlanner, ResearchOrchestrator};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# deepresearch configuration
# Override settings by editing this file, adding .deepresearch/local.yaml,
# or setting environment variables with the DEEPRESEARCH_ prefix
#
# Example environment variables:
#   export DEEPRESEARCH_RESEARCH__MAX_ROUNDS=5
#   export DEEPRESEARCH_ENGINES__VECTOR__URL=http://qdrant:6333
#   export DEEPRESEARCH_LOGGING__LEVEL=debug

research:
  # Stop researching once this many distinct documents are gathered
  min_evidence: 2
  # Hard cap on retrieval rounds per question
  max_rounds: 3
  # Results requested from each engine per round
  per_engine_limit: 5
  # Per-engine call timeout (milliseconds)
  engine_timeout_ms: 10000
  # Deadline for one whole question (seconds)
  session_deadline_secs: 120

engines:
  # Fan-out order; results are concatenated in this order
  enabled: [vector, graph, keyword]
  vector:
    url: "http://localhost:6333"
    collection: "deep_research"
  graph:
    url: "http://localhost:7474"
    database: "neo4j"
    user: "neo4j"
    # password: set NEO4J_PASSWORD instead of committing it
  keyword:
    path: ".deepresearch/keyword.db"

llm:
  base_url: "https://api.openai.com/v1"
  model: "gpt-4o-mini"
  temperature: 0.0
  timeout_secs: 60

embedding:
  base_url: "https://api.openai.com/v1"
  model: "text-embedding-3-small"
  dimension: 1536
  timeout_secs: 30

database:
  # Session checkpoints
  path: ".deepresearch/sessions.db"
  max_connections: 5

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"
  # Console format: json, pretty
  format: "pretty"
  # log_dir: ".deepresearch/logs"
  rotation: "daily"
  retention_days: 30
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    pub fn in_dir(root: &Path) -> Self {
        let config_dir = root.join(".deepresearch");
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Create the configuration directory and default config file
pub fn init_project(paths: &SetupPaths, force: bool) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;

    if paths.config_file.exists() && !force {
        return Ok(());
    }
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(())
}

/// Everything a command needs, built once from configuration.
pub struct ResearchStack {
    pub orchestrator: ResearchOrchestrator,
    /// Write side of each enabled engine, in fan-out order
    pub indexers: Vec<(EngineKind, Arc<dyn DocumentIndexer>)>,
}

/// Wire stores, engines and capabilities into an orchestrator.
///
/// Engines are constructed but not contacted; an unreachable backend only
/// shows up as a failed engine during retrieval.
pub async fn build_stack(config: &Config) -> Result<ResearchStack> {
    let research = &config.research;
    let engine_timeout = research.engine_timeout();

    let pool = initialize_database(
        &database_url(&config.database.path),
        Some(PoolConfig::with_max_connections(config.database.max_connections)),
    )
    .await
    .context("Failed to open checkpoint database")?;
    let checkpoints = Arc::new(SqliteCheckpointStore::new(pool));

    let chat = Arc::new(OpenAiChatClient::new(config.llm.clone())?);

    let mut retriever = FanOutRetriever::from_config(research);
    let mut indexers: Vec<(EngineKind, Arc<dyn DocumentIndexer>)> = Vec::new();

    for kind in &config.engines.enabled {
        let (engine, indexer) = match kind {
            EngineKind::Vector => {
                let embedder = Arc::new(OpenAiEmbeddingProvider::new(config.embedding.clone())?);
                let engine = Arc::new(QdrantVectorEngine::new(
                    config.engines.vector.clone(),
                    embedder,
                    engine_timeout,
                )?);
                read_write(engine)
            }
            EngineKind::Graph => {
                read_write(Arc::new(Neo4jGraphEngine::new(config.engines.graph.clone(), engine_timeout)?))
            }
            EngineKind::Keyword => {
                let pool = initialize_database(&database_url(&config.engines.keyword.path), None)
                    .await
                    .context("Failed to open keyword index")?;
                read_write(Arc::new(SqliteKeywordEngine::new(pool)))
            }
        };
        retriever = retriever.with_engine(*kind, engine);
        indexers.push((*kind, indexer));
    }

    tracing::debug!(engines = ?retriever.engine_kinds(), "retrieval engines configured");

    let orchestrator = ResearchOrchestrator::from_config(
        research,
        QueryPlanner::new(chat.clone()),
        retriever,
        chat,
        checkpoints,
    );

    Ok(ResearchStack {
        orchestrator,
        indexers,
    })
}

fn read_write<E>(engine: Arc<E>) -> (Arc<dyn RetrievalEngine>, Arc<dyn DocumentIndexer>)
where
    E: RetrievalEngine + DocumentIndexer + 'static,
{
    (engine.clone(), engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::ConfigLoader;

    #[test]
    fn test_default_template_is_valid_config() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        ConfigLoader::validate(&config).unwrap();
        assert_eq!(config.engines.enabled, EngineKind::ALL.to_vec());
    }

    #[test]
    fn test_init_project_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::in_dir(dir.path());

        init_project(&paths, false).unwrap();
        assert!(paths.is_initialized());

        fs::write(&paths.config_file, "research: {}\n").unwrap();
        init_project(&paths, false).unwrap();
        assert_eq!(fs::read_to_string(&paths.config_file).unwrap(), "research: {}\n");

        init_project(&paths, true).unwrap();
        assert!(fs::read_to_string(&paths.config_file).unwrap().contains("max_rounds"));
    }

    #[tokio::test]
    async fn test_build_stack_with_keyword_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.engines.enabled = vec![EngineKind::Keyword];
        config.engines.keyword.path = dir.path().join("kw.db").display().to_string();
        config.database.path = dir.path().join("sessions.db").display().to_string();

        let stack = build_stack(&config).await.unwrap();
        assert_eq!(stack.indexers.len(), 1);
        assert_eq!(stack.orchestrator.policy().max_rounds, 3);
    }
}
