//! # Inquest Tools
//!
//! Built-in retrieval tool implementations for the Inquest service:
//! web search plus the mock OSINT sources (social media, company registry,
//! academic records).

pub mod osint;
pub mod web;

use inquest_core::config::ToolsConfig;
use inquest_core::error::ToolError;
use inquest_core::tools::{RetrievalTool, ToolRegistry};
use std::sync::Arc;

/// Register all built-in retrieval tools and designate the configured
/// default (fallback) tool.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    config: &ToolsConfig,
) -> Result<(), ToolError> {
    let tools: Vec<Arc<dyn RetrievalTool>> = vec![
        Arc::new(web::WebSearchTool::new()),
        Arc::new(osint::SocialMediaSearchTool),
        Arc::new(osint::CompanyDatabaseSearchTool),
        Arc::new(osint::AcademicSearchTool),
    ];

    for tool in tools {
        registry.register(tool)?;
    }

    registry.set_default(&config.default_tool)?;
    Ok(())
}
