use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::document::EngineKind;

/// Main configuration structure for deepresearch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Research loop policy
    #[serde(default)]
    pub research: ResearchConfig,

    /// Retrieval engine configuration
    #[serde(default)]
    pub engines: EnginesConfig,

    /// Text-generation capability (rewrite + synthesis)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding capability used by the vector engine
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Checkpoint database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Research loop policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResearchConfig {
    /// Evidence count at which the loop stops researching
    #[serde(default = "default_min_evidence")]
    pub min_evidence: usize,

    /// Hard cap on retrieval rounds per question
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Results requested from each engine per round
    #[serde(default = "default_per_engine_limit")]
    pub per_engine_limit: usize,

    /// Per-engine call timeout in milliseconds
    #[serde(default = "default_engine_timeout_ms")]
    pub engine_timeout_ms: u64,

    /// Deadline for a whole session run in seconds
    #[serde(default = "default_session_deadline_secs")]
    pub session_deadline_secs: u64,
}

const fn default_min_evidence() -> usize {
    2
}

const fn default_max_rounds() -> u32 {
    3
}

const fn default_per_engine_limit() -> usize {
    5
}

const fn default_engine_timeout_ms() -> u64 {
    10_000
}

const fn default_session_deadline_secs() -> u64 {
    120
}

impl ResearchConfig {
    pub const fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    pub const fn session_deadline(&self) -> Duration {
        Duration::from_secs(self.session_deadline_secs)
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            min_evidence: default_min_evidence(),
            max_rounds: default_max_rounds(),
            per_engine_limit: default_per_engine_limit(),
            engine_timeout_ms: default_engine_timeout_ms(),
            session_deadline_secs: default_session_deadline_secs(),
        }
    }
}

/// Retrieval engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnginesConfig {
    /// Engines to fan out to, in result order
    #[serde(default = "default_enabled_engines")]
    pub enabled: Vec<EngineKind>,

    #[serde(default)]
    pub vector: VectorEngineConfig,

    #[serde(default)]
    pub graph: GraphEngineConfig,

    #[serde(default)]
    pub keyword: KeywordEngineConfig,
}

fn default_enabled_engines() -> Vec<EngineKind> {
    EngineKind::ALL.to_vec()
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_engines(),
            vector: VectorEngineConfig::default(),
            graph: GraphEngineConfig::default(),
            keyword: KeywordEngineConfig::default(),
        }
    }
}

/// Qdrant vector engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VectorEngineConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// API key (can also be set via QDRANT_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "deep_research".to_string()
}

impl Default for VectorEngineConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

/// Neo4j graph engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GraphEngineConfig {
    /// HTTP endpoint of the Neo4j server
    #[serde(default = "default_neo4j_url")]
    pub url: String,

    #[serde(default = "default_neo4j_database")]
    pub database: String,

    #[serde(default = "default_neo4j_user")]
    pub user: String,

    /// Password (can also be set via NEO4J_PASSWORD env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_neo4j_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

fn default_neo4j_user() -> String {
    "neo4j".to_string()
}

impl Default for GraphEngineConfig {
    fn default() -> Self {
        Self {
            url: default_neo4j_url(),
            database: default_neo4j_database(),
            user: default_neo4j_user(),
            password: None,
        }
    }
}

/// SQLite FTS5 keyword engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KeywordEngineConfig {
    /// Path to the keyword index database
    #[serde(default = "default_keyword_path")]
    pub path: String,
}

fn default_keyword_path() -> String {
    ".deepresearch/keyword.db".to_string()
}

impl Default for KeywordEngineConfig {
    fn default() -> Self {
        Self {
            path: default_keyword_path(),
        }
    }
}

/// OpenAI-compatible chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// API key (can also be set via OPENAI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_chat_model(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
            api_key: None,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout_secs(),
            api_key: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to the checkpoint `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".deepresearch/sessions.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Output format of the logger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Rotation policy for file logs
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub rotation: RotationPolicy,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
            retention_days: default_retention_days(),
        }
    }
}
