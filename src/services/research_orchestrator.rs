//! Research orchestrator - the multi-hop retrieval state machine
//!
//! Drives one question through
//! `Planning -> Researching -> Reviewing -> {Researching | Generating} -> Done`:
//! - Planning derives the standalone query once per question
//! - Researching fans out to every engine and merges into the evidence set
//! - Reviewing hands the decision to the termination policy
//! - Generating synthesizes the answer and appends it to the conversation
//!
//! Session state lives in a [`SessionCheckpoint`] loaded from and saved to the
//! checkpoint store. Runs for the same session are serialized; different
//! sessions never share mutable state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{ResearchError, ResearchResult};
use crate::domain::models::{
    PhaseRecord, ResearchConfig, ResearchPhase, RoundReport, SessionCheckpoint, SessionOutcome,
    Turn,
};
use crate::domain::ports::{CheckpointStore, Synthesizer};
use crate::services::fan_out_retriever::FanOutRetriever;
use crate::services::query_planner::QueryPlanner;
use crate::services::termination_router::TerminationPolicy;

/// Pure transition function of the research machine.
///
/// The only data-dependent edge is `Reviewing`, which defers to the
/// termination policy. `Done` is absorbing.
pub const fn transition(
    phase: ResearchPhase,
    policy: &TerminationPolicy,
    evidence: usize,
    rounds: u32,
) -> ResearchPhase {
    match phase {
        ResearchPhase::Planning => ResearchPhase::Researching,
        ResearchPhase::Researching => ResearchPhase::Reviewing,
        ResearchPhase::Reviewing => policy.route(evidence, rounds),
        ResearchPhase::Generating | ResearchPhase::Done => ResearchPhase::Done,
    }
}

/// Mutable state of one in-flight run.
struct SessionRun {
    checkpoint: SessionCheckpoint,
    phase: ResearchPhase,
    answer: Option<String>,
    rounds: Vec<RoundReport>,
    trace: Vec<PhaseRecord>,
}

impl SessionRun {
    fn new(checkpoint: SessionCheckpoint, phase: ResearchPhase) -> Self {
        Self {
            checkpoint,
            phase,
            answer: None,
            rounds: Vec::new(),
            trace: Vec::new(),
        }
    }

    fn record_phase(&mut self) {
        self.trace.push(PhaseRecord {
            phase: self.phase,
            round: self.checkpoint.rounds,
            evidence: self.checkpoint.evidence.len(),
        });
    }

    fn into_outcome(self) -> SessionOutcome {
        let checkpoint = self.checkpoint;
        SessionOutcome {
            session_id: checkpoint.session_id,
            answer: self.answer.unwrap_or_default(),
            evidence: checkpoint.evidence.into_documents(),
            rounds_used: checkpoint.rounds,
            plan: checkpoint.plan,
            rounds: self.rounds,
            trace: self.trace,
        }
    }
}

/// Top-level driver composing planner, fan-out retriever, evidence merge,
/// termination policy and synthesis.
pub struct ResearchOrchestrator {
    planner: QueryPlanner,
    retriever: FanOutRetriever,
    policy: TerminationPolicy,
    synthesizer: Arc<dyn Synthesizer>,
    store: Arc<dyn CheckpointStore>,
    session_deadline: Duration,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResearchOrchestrator {
    /// Default deadline for a full session run.
    pub const DEFAULT_SESSION_DEADLINE: Duration = Duration::from_secs(120);

    pub fn new(
        planner: QueryPlanner,
        retriever: FanOutRetriever,
        policy: TerminationPolicy,
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            planner,
            retriever,
            policy,
            synthesizer,
            store,
            session_deadline: Self::DEFAULT_SESSION_DEADLINE,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build with policy, fan-out limits and deadline taken from configuration.
    pub fn from_config(
        config: &ResearchConfig,
        planner: QueryPlanner,
        retriever: FanOutRetriever,
        synthesizer: Arc<dyn Synthesizer>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self::new(
            planner,
            retriever,
            TerminationPolicy::from_config(config),
            synthesizer,
            store,
        )
        .with_session_deadline(config.session_deadline())
    }

    #[must_use]
    pub fn with_session_deadline(mut self, deadline: Duration) -> Self {
        self.session_deadline = deadline;
        self
    }

    pub const fn policy(&self) -> &TerminationPolicy {
        &self.policy
    }

    /// Answer a new user turn in `session_id`.
    ///
    /// Prior history is resumed from the checkpoint store (a missing session
    /// starts fresh); retrieval state is reset for the new question.
    ///
    /// # Errors
    /// - `EmptyConversation` if `user_turn` is blank
    /// - `Planning` if the query rewrite fails
    /// - `SynthesisFailure` if generation fails (evidence is attached and the
    ///   unanswered checkpoint is saved so generation can be retried alone)
    /// - `DeadlineExceeded` if the run exceeds the session deadline
    /// - `Checkpoint` if loading or saving the session fails
    #[instrument(skip(self, user_turn), fields(session_id = %session_id))]
    pub async fn run_session(
        &self,
        session_id: &str,
        user_turn: &str,
    ) -> ResearchResult<SessionOutcome> {
        if user_turn.trim().is_empty() {
            return Err(ResearchError::EmptyConversation);
        }

        self.serialized(session_id, async {
            let mut checkpoint = self.load_or_fresh(session_id).await?;
            checkpoint.begin_question(Turn::user(user_turn));
            self.drive(SessionRun::new(checkpoint, ResearchPhase::Planning))
                .await
        })
        .await
    }

    /// Re-run only `Generating` for a session whose last question was
    /// researched but never answered (typically after a `SynthesisFailure`).
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn retry_generation(&self, session_id: &str) -> ResearchResult<SessionOutcome> {
        self.serialized(session_id, async {
            let checkpoint = self
                .store
                .load(session_id)
                .await
                .map_err(ResearchError::Checkpoint)?
                .filter(|cp| cp.conversation.awaiting_answer() && cp.rounds > 0)
                .ok_or_else(|| ResearchError::NothingToRegenerate(session_id.to_string()))?;

            self.drive(SessionRun::new(checkpoint, ResearchPhase::Generating))
                .await
        })
        .await
    }

    /// Run `work` under the per-session lock and the session deadline.
    async fn serialized<F>(&self, session_id: &str, work: F) -> ResearchResult<SessionOutcome>
    where
        F: std::future::Future<Output = ResearchResult<SessionOutcome>>,
    {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            match tokio::time::timeout(self.session_deadline, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(deadline = ?self.session_deadline, "session deadline exceeded");
                    Err(ResearchError::DeadlineExceeded {
                        deadline: self.session_deadline,
                    })
                }
            }
        };
        self.release_session_lock(session_id, lock).await;
        result
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }

    async fn release_session_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        // Only the map and this caller hold it: nobody is waiting.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(session_id);
        }
    }

    async fn load_or_fresh(&self, session_id: &str) -> ResearchResult<SessionCheckpoint> {
        let loaded = self
            .store
            .load(session_id)
            .await
            .map_err(ResearchError::Checkpoint)?;

        Ok(loaded.unwrap_or_else(|| {
            debug!("no checkpoint found; starting a fresh session");
            SessionCheckpoint::fresh(session_id)
        }))
    }

    /// Step the machine until `Done`.
    async fn drive(&self, mut run: SessionRun) -> ResearchResult<SessionOutcome> {
        loop {
            run.record_phase();
            debug!(phase = %run.phase, round = run.checkpoint.rounds, "entering phase");

            match run.phase {
                ResearchPhase::Planning => self.plan(&mut run).await?,
                ResearchPhase::Researching => self.research(&mut run).await,
                ResearchPhase::Reviewing => {}
                ResearchPhase::Generating => self.generate(&mut run).await?,
                ResearchPhase::Done => break,
            }

            run.phase = transition(
                run.phase,
                &self.policy,
                run.checkpoint.evidence.len(),
                run.checkpoint.rounds,
            );
        }

        self.save(&run.checkpoint).await?;

        info!(
            rounds = run.checkpoint.rounds,
            evidence = run.checkpoint.evidence.len(),
            "research session completed"
        );
        Ok(run.into_outcome())
    }

    async fn plan(&self, run: &mut SessionRun) -> ResearchResult<()> {
        let plan = self
            .planner
            .plan(&run.checkpoint.conversation)
            .await
            .map_err(ResearchError::Planning)?;
        debug!(plan = %plan, "retrieval plan ready");

        let checkpoint = &mut run.checkpoint;
        checkpoint.plan = plan;
        checkpoint.evidence.clear();
        checkpoint.rounds = 0;
        Ok(())
    }

    /// One round: fan out, merge, count. Engine failures are absorbed and a
    /// zero-yield round still counts toward the cap.
    async fn research(&self, run: &mut SessionRun) {
        let fan_out = self.retriever.retrieve(&run.checkpoint.plan).await;
        let retrieved = fan_out.documents.len();
        let failed_engines = fan_out.failed_engines();

        let checkpoint = &mut run.checkpoint;
        let fresh = checkpoint.evidence.merge_round(fan_out.documents);
        checkpoint.rounds += 1;
        checkpoint.touch();

        info!(
            round = checkpoint.rounds,
            retrieved,
            fresh,
            evidence = checkpoint.evidence.len(),
            failed = failed_engines.len(),
            "retrieval round finished"
        );

        run.rounds.push(RoundReport {
            round: checkpoint.rounds,
            retrieved,
            fresh,
            failed_engines,
        });
    }

    async fn generate(&self, run: &mut SessionRun) -> ResearchResult<()> {
        // Persist the researched question first so a failed generation can be
        // retried without retrieving again.
        self.save(&run.checkpoint).await?;

        let checkpoint = &mut run.checkpoint;
        let answer = match self
            .synthesizer
            .generate(
                checkpoint.conversation.turns(),
                checkpoint.evidence.documents(),
            )
            .await
        {
            Ok(answer) => answer,
            Err(source) => {
                warn!(error = %source, "synthesis failed");
                return Err(ResearchError::SynthesisFailure {
                    source,
                    evidence: checkpoint.evidence.documents().to_vec(),
                    rounds_used: checkpoint.rounds,
                });
            }
        };

        checkpoint.conversation.append(Turn::assistant(answer.clone()));
        checkpoint.touch();
        run.answer = Some(answer);
        Ok(())
    }

    async fn save(&self, checkpoint: &SessionCheckpoint) -> ResearchResult<()> {
        self.store
            .save(&checkpoint.session_id, checkpoint)
            .await
            .map_err(ResearchError::Checkpoint)
    }
}
