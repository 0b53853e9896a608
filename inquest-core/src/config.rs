//! Configuration for the Inquest service.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Top-level configuration for the Inquest service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquestConfig {
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub tools: ToolsConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "anthropic", "openai", "local".
    pub provider: String,
    /// Default model identifier.
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Temperature for generation; 0.0 keeps stage outputs factual.
    pub temperature: f32,
    /// Retry behavior for transient provider errors.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Optional per-stage model overrides.
    #[serde(default)]
    pub stage_models: StageModelsConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: None,
            max_tokens: 2048,
            temperature: 0.0,
            retry: RetryConfig::default(),
            stage_models: StageModelsConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Validate this config and return human-readable warnings for
    /// problematic values (does not error).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.max_tokens == 0 {
            warnings.push("max_tokens is 0; completions will be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0-2.0",
                self.temperature
            ));
        }
        warnings
    }
}

/// Retry configuration for transient LLM provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Optional per-stage model overrides.
///
/// The original service routed different pipeline stages to different models
/// (fast model for orchestration, a stronger one for judging). Each field, if
/// set, overrides `llm.model` for that stage's requests only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageModelsConfig {
    pub extract_entities: Option<String>,
    pub orchestrate: Option<String>,
    pub analyze: Option<String>,
    pub clean: Option<String>,
    pub write_report: Option<String>,
    pub judge: Option<String>,
}

/// Orchestration engine thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on retrieval loop iterations.
    pub max_retrievals: usize,
    /// Number of non-empty retrieved items considered sufficient to stop.
    pub sufficiency_threshold: usize,
    /// Maximum follow-up queries kept from one analyze pass.
    pub max_follow_up_queries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retrievals: 15,
            sufficiency_threshold: 8,
            max_follow_up_queries: 3,
        }
    }
}

/// HTTP server and event-delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Delivery poll period for the event stream, in milliseconds.
    pub poll_interval_ms: u64,
    /// Closed sessions abandoned by their client are swept after this long.
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8420,
            poll_interval_ms: 500,
            session_ttl_secs: 3600,
        }
    }
}

/// Retrieval tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Registry tool used when orchestration fails or selects an unknown tool.
    pub default_tool: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_tool: "web_search".to_string(),
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `INQUEST_`, nested via `__`)
/// 2. Config file (if a path is given and exists)
/// 3. Built-in defaults
pub fn load_config(config_path: Option<&Path>) -> Result<InquestConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(InquestConfig::default()));

    if let Some(path) = config_path {
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
    }

    // INQUEST_LLM__MODEL, INQUEST_SERVER__PORT, etc.
    figment = figment.merge(Env::prefixed("INQUEST_").split("__"));

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
