//! Stage executors for the investigation pipeline.
//!
//! Each stage performs exactly one external capability call (LLM or
//! retrieval) and recovers every failure locally with a well-defined
//! fallback. No stage error ever reaches the engine; the state after a
//! failed stage is degraded but valid, and the log records what happened.

use crate::brain::Brain;
use crate::config::{EngineConfig, StageModelsConfig};
use crate::error::InquestError;
use crate::prompts;
use crate::tools::ToolRegistry;
use crate::types::{CleanedData, InvestigationState, Profile, RetrievedItem};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Expected shape of the entity-extraction response.
#[derive(Debug, Deserialize)]
struct ExtractedEntities {
    entities: Vec<String>,
}

/// Expected shape of the orchestrator's tool selection.
#[derive(Debug, Deserialize)]
struct ToolSelection {
    tool_name: String,
    query: String,
}

/// Expected shape of the analyst response.
#[derive(Debug, Deserialize)]
struct AnalysisOutcome {
    analysis: String,
    #[serde(default)]
    follow_up_queries: Vec<String>,
}

/// Expected shape of the judge verdict.
#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    is_accurate: bool,
    #[serde(default)]
    reasoning: String,
}

/// Which pipeline stage a request belongs to, for per-stage model routing.
#[derive(Debug, Clone, Copy)]
enum StageKind {
    ExtractEntities,
    Orchestrate,
    Analyze,
    Clean,
    WriteReport,
    Judge,
}

/// The six stage executors, sharing one brain and one tool registry.
pub struct StageExecutors {
    brain: Arc<Brain>,
    tools: Arc<ToolRegistry>,
    config: EngineConfig,
    stage_models: StageModelsConfig,
}

impl StageExecutors {
    pub fn new(
        brain: Arc<Brain>,
        tools: Arc<ToolRegistry>,
        config: EngineConfig,
        stage_models: StageModelsConfig,
    ) -> Self {
        Self {
            brain,
            tools,
            config,
            stage_models,
        }
    }

    fn model_for(&self, stage: StageKind) -> Option<&str> {
        let models = &self.stage_models;
        match stage {
            StageKind::ExtractEntities => models.extract_entities.as_deref(),
            StageKind::Orchestrate => models.orchestrate.as_deref(),
            StageKind::Analyze => models.analyze.as_deref(),
            StageKind::Clean => models.clean.as_deref(),
            StageKind::WriteReport => models.write_report.as_deref(),
            StageKind::Judge => models.judge.as_deref(),
        }
    }

    /// Parse the query into investigative entities. Runs once, before the
    /// first loop iteration. Fallback: the original query is the sole entity.
    pub async fn extract_entities(&self, state: &mut InvestigationState) {
        state.push_log("Parsing query to identify entities...");
        let prompt = prompts::entity_extraction(&state.query);
        match self
            .brain
            .complete_json::<ExtractedEntities>(&prompt, self.model_for(StageKind::ExtractEntities))
            .await
        {
            Ok(parsed) => {
                state.entities = parsed.entities;
                state.push_log(format!("Identified entities: {:?}", state.entities));
            }
            Err(e) => {
                warn!(error = %e, "Entity extraction failed");
                state.entities = vec![state.query.clone()];
                state.push_log(format!(
                    "Entity extraction failed ({e}); using the original query as the sole entity."
                ));
            }
        }
    }

    /// Select a tool and sub-query, then issue exactly one retrieval call.
    /// Runs every iteration and is the only place `retrieval_count` moves.
    /// Fallback: the default tool with the original query.
    pub async fn orchestrate_and_retrieve(&self, state: &mut InvestigationState) {
        state.retrieval_count += 1;
        state.push_log(format!(
            "--- Investigation step #{} ---",
            state.retrieval_count
        ));

        // The first iteration pursues the original query; later ones pursue
        // the analyst's follow-ups.
        let candidates = if state.follow_up_queries.is_empty() {
            vec![state.query.clone()]
        } else {
            state.follow_up_queries.clone()
        };

        let prompt = prompts::orchestrator(
            &state.query,
            &state.analysis,
            &candidates,
            &self.tools.names(),
        );

        let outcome: Result<(String, Vec<RetrievedItem>), InquestError> = match self
            .brain
            .complete_json::<ToolSelection>(&prompt, self.model_for(StageKind::Orchestrate))
            .await
        {
            Ok(selection) => match self.tools.lookup(&selection.tool_name) {
                Ok(_) => {
                    state.push_log(format!(
                        "Orchestrator chose tool '{}' with query '{}'",
                        selection.tool_name, selection.query
                    ));
                    self.tools
                        .search(&selection.tool_name, &selection.query)
                        .await
                        .map(|items| (selection.tool_name, items))
                        .map_err(Into::into)
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok((tool_name, items)) => {
                state.push_log(format!("Retrieved {} items using {tool_name}.", items.len()));
                state.retrieved_data.extend(items);
            }
            Err(e) => {
                warn!(error = %e, "Orchestration failed, falling back to default tool");
                let fallback_name = self
                    .tools
                    .default_tool_name()
                    .unwrap_or("<default>")
                    .to_string();
                state.push_log(format!(
                    "Orchestration failed ({e}); falling back to {fallback_name} with the original query."
                ));
                match self.tools.search_default(&state.query).await {
                    Ok(items) => {
                        state.push_log(format!(
                            "Fallback {fallback_name} retrieved {} items.",
                            items.len()
                        ));
                        state.retrieved_data.extend(items);
                    }
                    Err(e) => {
                        state.push_log(format!(
                            "Fallback retrieval failed as well ({e}); continuing with no new data."
                        ));
                    }
                }
            }
        }
    }

    /// Synthesize the collected data and replace the follow-up queries.
    /// Fallback: clear the follow-ups, forcing the next termination check to
    /// stop; the existing analysis is kept.
    pub async fn analyze(&self, state: &mut InvestigationState) {
        state.push_log("Analyzing collected data...");
        let prompt = prompts::analyst(
            &state.query,
            &state.analysis,
            &state.context_text(),
            self.config.max_follow_up_queries,
        );
        match self
            .brain
            .complete_json::<AnalysisOutcome>(&prompt, self.model_for(StageKind::Analyze))
            .await
        {
            Ok(mut outcome) => {
                outcome
                    .follow_up_queries
                    .truncate(self.config.max_follow_up_queries);
                state.analysis = outcome.analysis;
                state.follow_up_queries = outcome.follow_up_queries;
                state.push_log(format!(
                    "Analysis updated; {} follow-up queries suggested.",
                    state.follow_up_queries.len()
                ));
            }
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                state.follow_up_queries = Vec::new();
                state.push_log(format!(
                    "Analysis failed ({e}); no further queries will be pursued."
                ));
            }
        }
    }

    /// Resolve the raw data into distinct identity profiles. Runs once, after
    /// the loop. An empty context is itself a failure. Fallback: a single
    /// zero-confidence error profile.
    pub async fn clean(&self, state: &mut InvestigationState) {
        state.push_log("Resolving collected data into distinct profiles...");
        let context = state.context_text();

        let outcome: Result<CleanedData, String> = if context.trim().is_empty() {
            Err("no retrieved content to clean".to_string())
        } else {
            let prompt = prompts::cleaner(&state.query, &context);
            self.brain
                .complete_json::<CleanedData>(&prompt, self.model_for(StageKind::Clean))
                .await
                .map(|mut data| {
                    for profile in &mut data.profiles {
                        profile.confidence_score = profile.confidence_score.clamp(0.0, 1.0);
                    }
                    data
                })
                .map_err(|e| e.to_string())
        };

        match outcome {
            Ok(data) => {
                state.push_log(format!(
                    "Resolved data into {} profile(s).",
                    data.profiles.len()
                ));
                state.cleaned_data = Some(data);
            }
            Err(msg) => {
                warn!(error = %msg, "Cleaning failed");
                let error_text = format!("Failed to clean data: {msg}");
                state.push_log(error_text.clone());
                state.cleaned_data = Some(CleanedData {
                    profiles: vec![Profile {
                        confidence_score: 0.0,
                        profile_name: "Error during cleaning".to_string(),
                        summary: error_text,
                        supporting_facts: Vec::new(),
                    }],
                });
            }
        }
    }

    /// Draft the report from the resolved profiles. Runs once.
    /// Fallback: a failure notice prefixed with "REPORT GENERATION FAILED: ".
    pub async fn write_report(&self, state: &mut InvestigationState) {
        state.push_log("Generating draft report...");

        let outcome: Result<String, String> = match &state.cleaned_data {
            Some(data) if !data.profiles.is_empty() => {
                match serde_json::to_string_pretty(data) {
                    Ok(cleaned_json) => {
                        let prompt = prompts::report_writer(&state.query, &cleaned_json);
                        self.brain
                            .complete_text(&prompt, self.model_for(StageKind::WriteReport))
                            .await
                            .map_err(|e| e.to_string())
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
            _ => Err("no structured profiles available for report generation".to_string()),
        };

        match outcome {
            Ok(text) if !text.trim().is_empty() => {
                state.final_report = text;
                state.push_log("Draft report generated.");
            }
            Ok(_) => {
                state.final_report =
                    "REPORT GENERATION FAILED: model returned an empty draft".to_string();
                state.push_log("Report generation failed: model returned an empty draft.");
            }
            Err(msg) => {
                warn!(error = %msg, "Report generation failed");
                state.final_report = format!("REPORT GENERATION FAILED: {msg}");
                state.push_log(format!("Report generation failed: {msg}"));
            }
        }
    }

    /// Final quality check on the drafted report. Runs once, terminal.
    /// A false verdict wraps the draft in a rejection notice; a failed call
    /// wraps it in an unverified notice. The draft itself is always preserved.
    pub async fn judge(&self, state: &mut InvestigationState) {
        state.push_log("Judge reviewing report for accuracy...");

        let cleaned_json = state
            .cleaned_data
            .as_ref()
            .and_then(|data| serde_json::to_string_pretty(data).ok())
            .unwrap_or_else(|| "{}".to_string());
        let prompt = prompts::judge(&cleaned_json, &state.final_report);

        match self
            .brain
            .complete_json::<JudgeVerdict>(&prompt, self.model_for(StageKind::Judge))
            .await
        {
            Ok(verdict) if verdict.is_accurate => {
                state.push_log("Judge approved the report.");
            }
            Ok(verdict) => {
                let reason = if verdict.reasoning.trim().is_empty() {
                    "No reason provided.".to_string()
                } else {
                    verdict.reasoning
                };
                state.push_log(format!("Judge rejected the report. Reason: {reason}"));
                state.final_report = format!(
                    "REPORT FAILED QUALITY CHECK\n\nREASON: {reason}\n\n---ORIGINAL DRAFT---\n{}",
                    state.final_report
                );
            }
            Err(e) => {
                warn!(error = %e, "Judge stage failed");
                let notice = format!("Judge stage failed: {e}. Report is unverified.");
                state.push_log(notice.clone());
                state.final_report =
                    format!("{notice}\n\n---UNVERIFIED REPORT---\n{}", state.final_report);
            }
        }
    }
}
