//! Retrieval tool trait and registry.
//!
//! The registry is a closed set of named retrieval capabilities with a
//! validated lookup: asking for an unregistered name is an explicit
//! `ToolError::NotFound`, never a silent no-op. One registered tool is
//! designated as the default, used by the orchestrate stage's fallback path.

use crate::error::ToolError;
use crate::types::RetrievedItem;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Trait that all retrieval tools must implement.
#[async_trait]
pub trait RetrievalTool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// Human-readable description of what this tool searches.
    fn description(&self) -> &str;

    /// Run one search and return the retrieved items.
    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError>;

    /// Maximum execution time before the registry gives up on a search.
    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }
}

/// The registry of retrieval tools available to the orchestrator.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn RetrievalTool>>,
    default_tool: Option<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            default_tool: None,
        }
    }

    /// Register a tool. Returns an error if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn RetrievalTool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered { name });
        }
        debug!(tool = %name, "Registering retrieval tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Designate the registry's default (fallback) tool.
    ///
    /// The name must already be registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), ToolError> {
        if !self.tools.contains_key(name) {
            return Err(ToolError::NotFound {
                name: name.to_string(),
            });
        }
        self.default_tool = Some(name.to_string());
        Ok(())
    }

    /// Name of the designated default tool, if any.
    pub fn default_tool_name(&self) -> Option<&str> {
        self.default_tool.as_deref()
    }

    /// Validated lookup: unknown names are a reportable failure.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn RetrievalTool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound {
                name: name.to_string(),
            })
    }

    /// List all registered tool names, sorted for stable prompt rendering.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a search on the named tool, applying its timeout.
    pub async fn search(&self, name: &str, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        let tool = self.lookup(name)?;

        let timeout = tool.timeout();
        info!(tool = %name, query = %query, "Running retrieval");

        match tokio::time::timeout(timeout, tool.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Execute a search on the default tool.
    ///
    /// Returns `ToolError::NotFound` if no default has been designated.
    pub async fn search_default(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        let name = self
            .default_tool
            .clone()
            .ok_or_else(|| ToolError::NotFound {
                name: "<default>".to_string(),
            })?;
        self.search(&name, query).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
