//! Service layer: the research loop and its collaborators.
//!
//! Services depend only on domain ports; adapters are injected at startup.

pub mod fan_out_retriever;
pub mod query_planner;
pub mod research_orchestrator;
pub mod termination_router;

pub use fan_out_retriever::{EngineFailure, FanOutResult, FanOutRetriever};
pub use query_planner::QueryPlanner;
pub use research_orchestrator::{transition, ResearchOrchestrator};
pub use termination_router::TerminationPolicy;
