//! Error types for the Inquest core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering LLM, retrieval tool, session, configuration, and engine domains.

/// Top-level error type for the Inquest core library.
#[derive(Debug, thiserror::Error)]
pub enum InquestError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from LLM provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from retrieval tool lookup and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown retrieval tool: {name}")]
    NotFound { name: String },

    #[error("Tool already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Tool '{name}' search failed: {message}")]
    SearchFailed { name: String, message: String },

    #[error("Tool '{name}' timed out after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {token}")]
    NotFound { token: String },

    #[error("Session {token} is closed")]
    Closed { token: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors from the orchestration engine that escape stage-level handling.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Session delivery failed: {0}")]
    Session(#[from] SessionError),

    #[error("Investigation task panicked: {message}")]
    Panicked { message: String },
}

/// A type alias for results using the top-level `InquestError`.
pub type Result<T> = std::result::Result<T, InquestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_llm() {
        let err = InquestError::Llm(LlmError::ApiRequest {
            message: "connection refused".into(),
        });
        assert_eq!(
            err.to_string(),
            "LLM error: API request failed: connection refused"
        );
    }

    #[test]
    fn test_error_display_tool() {
        let err = InquestError::Tool(ToolError::NotFound {
            name: "satellite_imagery".into(),
        });
        assert_eq!(
            err.to_string(),
            "Tool error: Unknown retrieval tool: satellite_imagery"
        );
    }

    #[test]
    fn test_error_display_session() {
        let err = InquestError::Session(SessionError::Closed {
            token: "abc".into(),
        });
        assert_eq!(err.to_string(), "Session error: Session abc is closed");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: InquestError = io_err.into();
        assert!(matches!(err, InquestError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: InquestError = serde_err.into();
        assert!(matches!(err, InquestError::Serialization(_)));
    }

    #[test]
    fn test_llm_error_variants() {
        let err = LlmError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Rate limited by provider, retry after 60s");

        let err = LlmError::ResponseParse {
            message: "missing field `entities`".into(),
        };
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_tool_error_variants() {
        let err = ToolError::Timeout {
            name: "web_search".into(),
            timeout_secs: 15,
        };
        assert_eq!(err.to_string(), "Tool 'web_search' timed out after 15s");
    }
}
