pub mod config;
pub mod conversation;
pub mod document;
pub mod evidence;
pub mod research;
pub mod session;

pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, EnginesConfig, GraphEngineConfig,
    KeywordEngineConfig, LlmConfig, LogFormat, LoggingConfig, ResearchConfig, RotationPolicy,
    VectorEngineConfig,
};
pub use conversation::{Conversation, Role, Turn};
pub use document::{Document, EngineKind, Metadata, MetadataValue, SearchHit};
pub use evidence::EvidenceSet;
pub use research::{PhaseRecord, ResearchPhase, RoundReport, SessionOutcome};
pub use session::SessionCheckpoint;
