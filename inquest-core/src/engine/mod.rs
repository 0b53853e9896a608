//! Orchestration engine — drives the investigation state machine.
//!
//! One engine instance serves the whole process; each call to [`InvestigationEngine::run`]
//! drives one investigation as a sequential pipeline, appending progress to
//! that investigation's session as each stage completes. Failures inside a
//! stage are the stage's problem; anything that escapes stage handling is
//! caught exactly once here, and the session always reaches its end marker.

pub mod policy;
pub mod stages;

use crate::brain::Brain;
use crate::config::InquestConfig;
use crate::error::EngineError;
use crate::session::{SessionEvent, SessionStore};
use crate::tools::ToolRegistry;
use crate::types::InvestigationState;
use futures::FutureExt;
use policy::Verdict;
use stages::StageExecutors;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Report text delivered when the engine itself fails.
const FAILURE_NOTICE: &str = "ERROR: Investigation failed. See logs for details.";

/// Phases of the investigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestigationPhase {
    EntityExtraction,
    OrchestrateRetrieve,
    Analyze,
    CheckTermination,
    Clean,
    Write,
    Judge,
    Done,
}

impl std::fmt::Display for InvestigationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InvestigationPhase::EntityExtraction => "entity_extraction",
            InvestigationPhase::OrchestrateRetrieve => "orchestrate_retrieve",
            InvestigationPhase::Analyze => "analyze",
            InvestigationPhase::CheckTermination => "check_termination",
            InvestigationPhase::Clean => "clean",
            InvestigationPhase::Write => "write",
            InvestigationPhase::Judge => "judge",
            InvestigationPhase::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// The orchestration engine: sequences the stage executors, applies the
/// termination policy, and streams progress into the session store.
pub struct InvestigationEngine {
    stages: StageExecutors,
    config: InquestConfig,
}

impl InvestigationEngine {
    pub fn new(brain: Arc<Brain>, tools: Arc<ToolRegistry>, config: InquestConfig) -> Self {
        let stages = StageExecutors::new(
            brain,
            tools,
            config.engine.clone(),
            config.llm.stage_models.clone(),
        );
        Self { stages, config }
    }

    /// Run one investigation to completion, streaming progress into the
    /// session identified by `token`.
    ///
    /// Never returns an error: stage failures are recovered by the stages,
    /// and anything that escapes them (including panics) is caught here,
    /// logged, and converted into a generic failure report. The session
    /// always receives a report event followed by the end marker.
    #[instrument(skip(self, store), fields(token = %token))]
    pub async fn run(
        &self,
        query: String,
        store: Arc<SessionStore>,
        token: String,
    ) -> InvestigationState {
        let mut state = InvestigationState::new(query);
        let mut cursor = 0;

        let outcome = AssertUnwindSafe(self.run_phases(&mut state, &store, &token, &mut cursor))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                info!(retrievals = state.retrieval_count, "Investigation complete");
            }
            Ok(Err(e)) => {
                error!(error = %e, "Investigation failed outside stage handling");
                state.push_log(format!("Internal failure: {e}"));
                state.final_report = FAILURE_NOTICE.to_string();
            }
            Err(panic) => {
                let message = panic_message(panic);
                error!(panic = %message, "Investigation task panicked");
                state.push_log(format!(
                    "Internal failure: {}",
                    EngineError::Panicked { message }
                ));
                state.final_report = FAILURE_NOTICE.to_string();
            }
        }

        // Deliver whatever made it into the log, then close the stream.
        // Best-effort: the session outlives the engine unless the process is
        // shutting down, and the client-visible stream must never hang.
        self.mirror_log(&state, &store, &token, &mut cursor);
        if let Err(e) = store.append(&token, SessionEvent::Report(state.final_report.clone())) {
            error!(error = %e, "Failed to deliver final report event");
        }
        if let Err(e) = store.append(&token, SessionEvent::End) {
            error!(error = %e, "Failed to deliver end marker");
        }

        state
    }

    /// Spawn `run` as a detached background task (fire-and-forget).
    pub fn spawn(
        self: Arc<Self>,
        query: String,
        store: Arc<SessionStore>,
        token: String,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run(query, store, token).await;
        })
    }

    /// Drive the state machine from its initial phase to `Done`.
    ///
    /// Entity extraction is entered only for a fresh state; the retrieval
    /// loop cycles `OrchestrateRetrieve -> Analyze -> CheckTermination`
    /// until the policy says stop, then the clean / write / judge tail runs.
    async fn run_phases(
        &self,
        state: &mut InvestigationState,
        store: &SessionStore,
        token: &str,
        cursor: &mut usize,
    ) -> Result<(), EngineError> {
        // The opening log entry from state creation.
        self.publish(state, store, token, cursor)?;

        let mut phase = if state.retrieval_count == 0 {
            InvestigationPhase::EntityExtraction
        } else {
            InvestigationPhase::OrchestrateRetrieve
        };

        while phase != InvestigationPhase::Done {
            tracing::debug!(phase = %phase, "Entering phase");
            phase = match phase {
                InvestigationPhase::EntityExtraction => {
                    self.stages.extract_entities(state).await;
                    InvestigationPhase::OrchestrateRetrieve
                }
                InvestigationPhase::OrchestrateRetrieve => {
                    self.stages.orchestrate_and_retrieve(state).await;
                    InvestigationPhase::Analyze
                }
                InvestigationPhase::Analyze => {
                    self.stages.analyze(state).await;
                    InvestigationPhase::CheckTermination
                }
                InvestigationPhase::CheckTermination => {
                    match policy::evaluate(state, &self.config.engine) {
                        Verdict::Continue => {
                            state.push_log("Continuing investigation.".to_string());
                            InvestigationPhase::OrchestrateRetrieve
                        }
                        Verdict::Stop(reason) => {
                            state.push_log(format!("Ending retrieval loop: {reason}."));
                            InvestigationPhase::Clean
                        }
                    }
                }
                InvestigationPhase::Clean => {
                    self.stages.clean(state).await;
                    InvestigationPhase::Write
                }
                InvestigationPhase::Write => {
                    self.stages.write_report(state).await;
                    InvestigationPhase::Judge
                }
                InvestigationPhase::Judge => {
                    self.stages.judge(state).await;
                    InvestigationPhase::Done
                }
                InvestigationPhase::Done => InvestigationPhase::Done,
            };
            self.publish(state, store, token, cursor)?;
        }

        Ok(())
    }

    /// Mirror log entries the stages appended since the last call into the
    /// session, preserving causal order.
    fn publish(
        &self,
        state: &InvestigationState,
        store: &SessionStore,
        token: &str,
        cursor: &mut usize,
    ) -> Result<(), EngineError> {
        for entry in &state.log[*cursor..] {
            store.append(token, SessionEvent::Log(entry.clone()))?;
        }
        *cursor = state.log.len();
        Ok(())
    }

    /// Best-effort variant of [`publish`] for the cleanup path.
    fn mirror_log(
        &self,
        state: &InvestigationState,
        store: &SessionStore,
        token: &str,
        cursor: &mut usize,
    ) {
        for entry in &state.log[*cursor..] {
            if store
                .append(token, SessionEvent::Log(entry.clone()))
                .is_err()
            {
                break;
            }
        }
        *cursor = state.log.len();
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
