//! Core type definitions for Inquest.
//!
//! Defines the investigation data model (state, retrieved items, resolved
//! profiles) and the message types exchanged with LLM providers.

use serde::{Deserialize, Serialize};

/// A participant role in an LLM conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// A request for an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Optional per-request model override; defaults to the provider's model.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Build a single-turn request from one user prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
            model: None,
            max_tokens: 2048,
            temperature: 0.0,
        }
    }

    /// Override the model for this request.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A completed LLM response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub message: Message,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// One item of raw material returned by a retrieval tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Name of the tool (or mock source) that produced this item.
    pub source: String,
    /// Free-text content; may be empty for tools that found nothing useful.
    pub content: String,
}

impl RetrievedItem {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// One candidate distinct identity resolved out of possibly conflated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Confidence that this profile describes a real, distinct subject, in [0.0, 1.0].
    pub confidence_score: f64,
    pub profile_name: String,
    pub summary: String,
    #[serde(default)]
    pub supporting_facts: Vec<String>,
}

/// Structured output of the clean/resolve stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedData {
    pub profiles: Vec<Profile>,
}

/// The complete mutable state of one investigation.
///
/// Owned exclusively by the engine task driving that investigation and never
/// shared across investigations. `retrieved_data` and `log` are append-only;
/// `analysis` and `follow_up_queries` are rewritten by the analyze stage each
/// iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationState {
    /// The original subject query; immutable after creation.
    pub query: String,
    /// Entities extracted from the query; set once before the first iteration.
    pub entities: Vec<String>,
    /// Everything retrieved so far, in retrieval order.
    pub retrieved_data: Vec<RetrievedItem>,
    /// Human-readable progress log, in causal order of stage completion.
    pub log: Vec<String>,
    /// Current synthesis; overwritten by the analyze stage.
    pub analysis: String,
    /// Queries the analyst wants pursued next; fully replaced each iteration.
    pub follow_up_queries: Vec<String>,
    /// Number of completed retrieval loop iterations.
    pub retrieval_count: usize,
    /// Resolved profiles; set once, after the loop ends.
    pub cleaned_data: Option<CleanedData>,
    /// The report text; empty until the write stage runs.
    pub final_report: String,
}

impl InvestigationState {
    /// Create the initial state for a query, including the opening log entry.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            entities: Vec::new(),
            retrieved_data: Vec::new(),
            log: vec![format!("Beginning investigation for query: {query}")],
            analysis: "No analysis yet.".to_string(),
            follow_up_queries: Vec::new(),
            retrieval_count: 0,
            cleaned_data: None,
            final_report: String::new(),
            query,
        }
    }

    /// Append a progress entry to the investigation log.
    pub fn push_log(&mut self, entry: impl Into<String>) {
        self.log.push(entry.into());
    }

    /// Number of retrieved items with non-empty content.
    pub fn valid_item_count(&self) -> usize {
        self.retrieved_data
            .iter()
            .filter(|item| !item.content.trim().is_empty())
            .count()
    }

    /// All non-empty retrieved content joined into one analyst context block.
    pub fn context_text(&self) -> String {
        self.retrieved_data
            .iter()
            .filter(|item| !item.content.trim().is_empty())
            .map(|item| item.content.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = InvestigationState::new("Jane Doe");
        assert_eq!(state.query, "Jane Doe");
        assert!(state.entities.is_empty());
        assert!(state.retrieved_data.is_empty());
        assert_eq!(state.retrieval_count, 0);
        assert!(state.cleaned_data.is_none());
        assert!(state.final_report.is_empty());
        assert_eq!(state.analysis, "No analysis yet.");
        // The opening log entry is present from the start.
        assert_eq!(state.log.len(), 1);
        assert!(state.log[0].contains("Jane Doe"));
    }

    #[test]
    fn test_valid_item_count_skips_empty_content() {
        let mut state = InvestigationState::new("test");
        state
            .retrieved_data
            .push(RetrievedItem::new("web_search", "something useful"));
        state.retrieved_data.push(RetrievedItem::new("web_search", ""));
        state
            .retrieved_data
            .push(RetrievedItem::new("academic_search", "   "));
        assert_eq!(state.retrieved_data.len(), 3);
        assert_eq!(state.valid_item_count(), 1);
    }

    #[test]
    fn test_context_text_joins_non_empty() {
        let mut state = InvestigationState::new("test");
        state.retrieved_data.push(RetrievedItem::new("a", "first"));
        state.retrieved_data.push(RetrievedItem::new("b", ""));
        state.retrieved_data.push(RetrievedItem::new("c", "second"));
        assert_eq!(state.context_text(), "first\n---\nsecond");
    }

    #[test]
    fn test_profile_serialization() {
        let profile = Profile {
            confidence_score: 0.95,
            profile_name: "AI Researcher".into(),
            summary: "A researcher at a university.".into(),
            supporting_facts: vec!["Listed on the faculty page.".into()],
        };
        let json = serde_json::to_string(&profile).unwrap();
        let restored: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, profile);
    }

    #[test]
    fn test_profile_supporting_facts_default_to_empty() {
        let profile: Profile = serde_json::from_str(
            r#"{"confidence_score": 0.5, "profile_name": "X", "summary": "Y"}"#,
        )
        .unwrap();
        assert!(profile.supporting_facts.is_empty());
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
        assert_eq!(Message::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_from_prompt() {
        let req = CompletionRequest::from_prompt("hello").with_model(Some("claude-x".into()));
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "hello");
        assert_eq!(req.model.as_deref(), Some("claude-x"));
        assert_eq!(req.temperature, 0.0);
    }
}
