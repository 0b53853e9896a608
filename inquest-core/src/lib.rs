//! # Inquest Core
//!
//! Core library for the Inquest investigative research service.
//! Provides the orchestration engine, stage executors, termination policy,
//! LLM interface (brain), retrieval tool registry, session store,
//! configuration, and fundamental types.

pub mod brain;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod tools;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{Brain, LlmProvider, MockLlmProvider};
pub use config::{EngineConfig, InquestConfig, LlmConfig, ServerConfig, ToolsConfig, load_config};
pub use engine::policy::{StopReason, Verdict};
pub use engine::{InvestigationEngine, InvestigationPhase};
pub use error::{InquestError, LlmError, Result, SessionError, ToolError};
pub use session::{SessionEvent, SessionStore};
pub use tools::{RetrievalTool, ToolRegistry};
pub use types::{CleanedData, InvestigationState, Profile, RetrievedItem};
