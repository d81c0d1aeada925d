//! Fan-out retrieval across every configured engine.
//!
//! One round issues the same query to all engines in parallel, waits for all
//! of them (fan-in barrier) and returns their documents concatenated in the
//! configured engine order. A failing or slow engine contributes nothing and
//! never fails the round.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Document, EngineKind, ResearchConfig, SearchHit};
use crate::domain::ports::RetrievalEngine;

/// An engine that failed during a round.
#[derive(Debug)]
pub struct EngineFailure {
    pub engine: EngineKind,
    pub error: DomainError,
}

/// Joined output of one fan-out.
#[derive(Debug, Default)]
pub struct FanOutResult {
    /// Tagged documents in engine order, each engine's own order preserved
    pub documents: Vec<Document>,
    /// Engines whose call failed or timed out
    pub failures: Vec<EngineFailure>,
}

impl FanOutResult {
    pub fn failed_engines(&self) -> Vec<EngineKind> {
        self.failures.iter().map(|f| f.engine).collect()
    }
}

/// Aborts still-running searches if the round itself is dropped (for
/// instance when the session deadline fires mid-round).
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Concurrent retriever over a fixed, ordered set of engines.
pub struct FanOutRetriever {
    engines: Vec<(EngineKind, Arc<dyn RetrievalEngine>)>,
    per_engine_limit: usize,
    engine_timeout: Duration,
}

impl FanOutRetriever {
    /// Create a retriever with no engines.
    ///
    /// # Arguments
    /// * `per_engine_limit` - Maximum hits requested from each engine (at least 1)
    /// * `engine_timeout` - Bound on a single engine call
    pub fn new(per_engine_limit: usize, engine_timeout: Duration) -> Self {
        Self {
            engines: Vec::new(),
            per_engine_limit: per_engine_limit.max(1),
            engine_timeout,
        }
    }

    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.per_engine_limit, config.engine_timeout())
    }

    /// Register an engine. Registration order is result order; registering
    /// the same kind twice replaces the earlier adapter in place.
    #[must_use]
    pub fn with_engine(mut self, kind: EngineKind, engine: Arc<dyn RetrievalEngine>) -> Self {
        if let Some(slot) = self.engines.iter_mut().find(|(k, _)| *k == kind) {
            warn!(engine = %kind, "replacing already registered retrieval engine");
            slot.1 = engine;
        } else {
            self.engines.push((kind, engine));
        }
        self
    }

    pub fn engine_kinds(&self) -> Vec<EngineKind> {
        self.engines.iter().map(|(k, _)| *k).collect()
    }

    pub const fn per_engine_limit(&self) -> usize {
        self.per_engine_limit
    }

    /// Run one fan-out round for `plan`.
    pub async fn retrieve(&self, plan: &str) -> FanOutResult {
        let plan: Arc<str> = Arc::from(plan);
        let limit = self.per_engine_limit;
        let timeout = self.engine_timeout;

        let handles: Vec<_> = self
            .engines
            .iter()
            .map(|(kind, engine)| {
                let kind = *kind;
                let engine = Arc::clone(engine);
                let plan = Arc::clone(&plan);
                tokio::spawn(async move { search_engine(kind, engine, &plan, limit, timeout).await })
            })
            .collect();
        let _abort = AbortOnDrop(handles.iter().map(tokio::task::JoinHandle::abort_handle).collect());

        // join_all yields in input order, which is the configured engine order.
        let joined = join_all(handles).await;

        let mut result = FanOutResult::default();
        for ((kind, _), outcome) in self.engines.iter().zip(joined) {
            let outcome = outcome.unwrap_or_else(|e| {
                Err(DomainError::unavailable(*kind, format!("search task aborted: {e}")))
            });

            match outcome {
                Ok(mut hits) => {
                    if hits.len() > limit {
                        debug!(engine = %kind, returned = hits.len(), limit, "truncating over-long engine result");
                        hits.truncate(limit);
                    }
                    debug!(engine = %kind, hits = hits.len(), "engine search completed");
                    result
                        .documents
                        .extend(hits.into_iter().map(|hit| Document::from_hit(hit, *kind)));
                }
                Err(error) => {
                    warn!(engine = %kind, error = %error, "retrieval engine failed; continuing without it");
                    result.failures.push(EngineFailure { engine: *kind, error });
                }
            }
        }

        result
    }
}

/// One isolated engine call. Timeouts and non-availability errors are all
/// reported as `BackendUnavailable` for the engine.
async fn search_engine(
    kind: EngineKind,
    engine: Arc<dyn RetrievalEngine>,
    plan: &str,
    limit: usize,
    timeout: Duration,
) -> DomainResult<Vec<SearchHit>> {
    match tokio::time::timeout(timeout, engine.search(plan, limit)).await {
        Ok(Ok(hits)) => Ok(hits),
        Ok(Err(err)) if err.is_backend_unavailable() => Err(err),
        Ok(Err(err)) => Err(DomainError::unavailable(kind, err.to_string())),
        Err(_) => Err(DomainError::unavailable(
            kind,
            format!("{} did not answer within {timeout:?}", engine.name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedEngine(Vec<&'static str>);

    #[async_trait]
    impl RetrievalEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _query: &str, limit: usize) -> DomainResult<Vec<SearchHit>> {
            Ok(self
                .0
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, c)| SearchHit::new(*c, 1.0 / (i as f64 + 1.0)))
                .collect())
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl RetrievalEngine for BrokenEngine {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn search(&self, _query: &str, _limit: usize) -> DomainResult<Vec<SearchHit>> {
            Err(DomainError::ExecutionFailed("socket closed".to_string()))
        }
    }

    struct SlowEngine;

    #[async_trait]
    impl RetrievalEngine for SlowEngine {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn search(&self, _query: &str, _limit: usize) -> DomainResult<Vec<SearchHit>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![SearchHit::new("late", 1.0)])
        }
    }

    #[tokio::test]
    async fn test_results_follow_engine_order() {
        let retriever = FanOutRetriever::new(5, Duration::from_secs(1))
            .with_engine(EngineKind::Vector, Arc::new(FixedEngine(vec!["v1", "v2"])))
            .with_engine(EngineKind::Graph, Arc::new(FixedEngine(vec!["g1"])))
            .with_engine(EngineKind::Keyword, Arc::new(FixedEngine(vec!["k1"])));

        let result = retriever.retrieve("q").await;

        let tagged: Vec<_> = result
            .documents
            .iter()
            .map(|d| (d.content.as_str(), d.origin_engine))
            .collect();
        assert_eq!(
            tagged,
            vec![
                ("v1", EngineKind::Vector),
                ("v2", EngineKind::Vector),
                ("g1", EngineKind::Graph),
                ("k1", EngineKind::Keyword),
            ]
        );
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_normalized() {
        let retriever = FanOutRetriever::new(5, Duration::from_secs(1))
            .with_engine(EngineKind::Vector, Arc::new(BrokenEngine))
            .with_engine(EngineKind::Keyword, Arc::new(FixedEngine(vec!["k1"])));

        let result = retriever.retrieve("q").await;

        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.failed_engines(), vec![EngineKind::Vector]);
        assert!(result.failures[0].error.is_backend_unavailable());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_unavailable() {
        let retriever = FanOutRetriever::new(5, Duration::from_millis(50))
            .with_engine(EngineKind::Graph, Arc::new(SlowEngine))
            .with_engine(EngineKind::Keyword, Arc::new(FixedEngine(vec!["k1"])));

        let result = retriever.retrieve("q").await;

        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.failed_engines(), vec![EngineKind::Graph]);
    }

    #[tokio::test]
    async fn test_registering_same_kind_replaces() {
        let retriever = FanOutRetriever::new(5, Duration::from_secs(1))
            .with_engine(EngineKind::Vector, Arc::new(BrokenEngine))
            .with_engine(EngineKind::Graph, Arc::new(FixedEngine(vec!["g"])))
            .with_engine(EngineKind::Vector, Arc::new(FixedEngine(vec!["v"])));

        assert_eq!(retriever.engine_kinds(), vec![EngineKind::Vector, EngineKind::Graph]);
        let result = retriever.retrieve("q").await;
        assert_eq!(result.documents[0].content, "v");
    }

    #[tokio::test]
    async fn test_limit_is_enforced() {
        struct Greedy;

        #[async_trait]
        impl RetrievalEngine for Greedy {
            fn name(&self) -> &'static str {
                "greedy"
            }

            async fn search(&self, _query: &str, _limit: usize) -> DomainResult<Vec<SearchHit>> {
                Ok((0..10).map(|i| SearchHit::new(format!("d{i}"), 1.0)).collect())
            }
        }

        let retriever = FanOutRetriever::new(3, Duration::from_secs(1))
            .with_engine(EngineKind::Keyword, Arc::new(Greedy));
        assert_eq!(retriever.retrieve("q").await.documents.len(), 3);
    }
}
