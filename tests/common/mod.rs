//! Common test utilities for integration tests
//!
//! Scripted engines and capabilities so the research loop can be driven
//! deterministically without any real backend.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deepresearch::adapters::memory::InMemoryCheckpointStore;
use deepresearch::domain::errors::{DomainError, DomainResult};
use deepresearch::domain::models::{Document, EngineKind, SearchHit, Turn};
use deepresearch::domain::ports::{CheckpointStore, QueryRewriter, RetrievalEngine, Synthesizer};
use deepresearch::services::{FanOutRetriever, QueryPlanner, ResearchOrchestrator, TerminationPolicy};

/// Engine that answers call `n` with `rounds[n]` (the last entry repeats).
pub struct ScriptedEngine {
    rounds: Vec<Vec<SearchHit>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(rounds: Vec<Vec<SearchHit>>) -> Arc<Self> {
        Arc::new(Self {
            rounds,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search(&self, query: &str, limit: usize) -> DomainResult<Vec<SearchHit>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        let hits = self
            .rounds
            .get(call)
            .or_else(|| self.rounds.last())
            .cloned()
            .unwrap_or_default();
        Ok(hits.into_iter().take(limit).collect())
    }
}

/// Engine that is always down.
pub struct DownEngine {
    pub kind: EngineKind,
    pub calls: AtomicUsize,
}

impl DownEngine {
    pub fn new(kind: EngineKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RetrievalEngine for DownEngine {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn search(&self, _query: &str, _limit: usize) -> DomainResult<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::unavailable(self.kind, "connection refused"))
    }
}

/// Engine that takes `delay` before answering with one hit.
pub struct SlowEngine {
    pub delay: Duration,
}

#[async_trait]
impl RetrievalEngine for SlowEngine {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn search(&self, query: &str, _limit: usize) -> DomainResult<Vec<SearchHit>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![hit(&format!("slow answer to {query}"), 1.0)])
    }
}

/// Rewriter that returns a fixed query and counts invocations.
pub struct ScriptedRewriter {
    pub output: String,
    pub calls: AtomicUsize,
}

impl ScriptedRewriter {
    pub fn new(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryRewriter for ScriptedRewriter {
    async fn rewrite(&self, _history: &[Turn], _latest: &str) -> DomainResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Synthesizer that can be switched between failing and answering.
pub struct ScriptedSynthesizer {
    pub failing: AtomicBool,
    pub calls: AtomicUsize,
    pub seen_evidence: Mutex<Vec<usize>>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            seen_evidence: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        let synth = Self::new();
        synth.set_failing(true);
        synth
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Synthesizer for ScriptedSynthesizer {
    async fn generate(&self, history: &[Turn], evidence: &[Document]) -> DomainResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_evidence.lock().unwrap().push(evidence.len());
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::SynthesisFailed("model unavailable".to_string()));
        }
        let question = history.last().map(|t| t.content.as_str()).unwrap_or_default();
        Ok(format!("answer to '{question}' from {} document(s)", evidence.len()))
    }
}

pub fn hit(content: &str, score: f64) -> SearchHit {
    SearchHit::new(content, score).with_metadata("source", format!("{content}.txt"))
}

/// Orchestrator over in-memory state with the given engines (in fan-out order).
pub struct Harness {
    pub orchestrator: ResearchOrchestrator,
    pub store: Arc<InMemoryCheckpointStore>,
    pub rewriter: Arc<ScriptedRewriter>,
    pub synthesizer: Arc<ScriptedSynthesizer>,
}

pub fn harness(
    engines: Vec<(EngineKind, Arc<dyn RetrievalEngine>)>,
    policy: TerminationPolicy,
    synthesizer: Arc<ScriptedSynthesizer>,
) -> Harness {
    let store = Arc::new(InMemoryCheckpointStore::new());
    harness_with_store(engines, policy, synthesizer, store)
}

pub fn harness_with_store(
    engines: Vec<(EngineKind, Arc<dyn RetrievalEngine>)>,
    policy: TerminationPolicy,
    synthesizer: Arc<ScriptedSynthesizer>,
    store: Arc<InMemoryCheckpointStore>,
) -> Harness {
    let rewriter = ScriptedRewriter::new("standalone query");
    let retriever = engines
        .into_iter()
        .fold(FanOutRetriever::new(5, Duration::from_millis(500)), |r, (kind, engine)| {
            r.with_engine(kind, engine)
        });

    let orchestrator = ResearchOrchestrator::new(
        QueryPlanner::new(rewriter.clone()),
        retriever,
        policy,
        synthesizer.clone(),
        store.clone() as Arc<dyn CheckpointStore>,
    );

    Harness {
        orchestrator,
        store,
        rewriter,
        synthesizer,
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
