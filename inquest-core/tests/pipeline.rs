//! End-to-end pipeline scenarios driven through the full engine with a mock
//! LLM provider and stub retrieval tools.

use async_trait::async_trait;
use inquest_core::brain::{Brain, MockLlmProvider};
use inquest_core::config::{InquestConfig, LlmConfig, RetryConfig};
use inquest_core::engine::InvestigationEngine;
use inquest_core::error::ToolError;
use inquest_core::session::{SessionEvent, SessionStore};
use inquest_core::tools::{RetrievalTool, ToolRegistry};
use inquest_core::types::RetrievedItem;
use serde_json::json;
use std::sync::Arc;

/// Stub web search producing a fixed number of items per call, with either
/// useful or empty content.
struct StubSearch {
    items_per_search: usize,
    empty_content: bool,
}

#[async_trait]
impl RetrievalTool for StubSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Stub web search"
    }

    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        Ok((0..self.items_per_search)
            .map(|i| {
                let content = if self.empty_content {
                    String::new()
                } else {
                    format!("An article mentioning {query}, hit {i}.")
                };
                RetrievedItem::new("web_search", content)
            })
            .collect())
    }
}

fn make_engine(mock: Arc<MockLlmProvider>, tool: StubSearch) -> InvestigationEngine {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(tool)).unwrap();
    registry.set_default("web_search").unwrap();

    let config = InquestConfig {
        llm: LlmConfig {
            retry: RetryConfig {
                max_retries: 0,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let brain = Arc::new(Brain::new(mock, &config.llm));
    InvestigationEngine::new(brain, Arc::new(registry), config)
}

fn queue_tail(mock: &MockLlmProvider) {
    mock.queue_json(json!({
        "profiles": [{
            "confidence_score": 0.9,
            "profile_name": "Jane Doe, Researcher",
            "summary": "A single clear identity.",
            "supporting_facts": ["Mentioned in several articles."]
        }]
    }));
    mock.queue_text("1. Executive Summary\nJane Doe is a researcher.");
    mock.queue_json(json!({"is_accurate": true, "reasoning": "Supported."}));
}

/// Scenario A: every stage succeeds; 5 items per retrieval means the 8-item
/// sufficiency threshold is crossed during iteration 2.
#[tokio::test]
async fn scenario_a_stops_on_sufficiency_and_streams_report() {
    let mock = Arc::new(MockLlmProvider::new());
    mock.queue_json(json!({"entities": ["Jane Doe"]}));
    // Iteration 1
    mock.queue_json(json!({"tool_name": "web_search", "query": "Jane Doe"}));
    mock.queue_json(json!({"analysis": "One lead.", "follow_up_queries": ["Jane Doe employer"]}));
    // Iteration 2
    mock.queue_json(json!({"tool_name": "web_search", "query": "Jane Doe employer"}));
    mock.queue_json(json!({"analysis": "Leads firming up.", "follow_up_queries": ["Jane Doe publications"]}));
    queue_tail(&mock);

    let engine = make_engine(
        mock,
        StubSearch {
            items_per_search: 5,
            empty_content: false,
        },
    );
    let store = Arc::new(SessionStore::new());
    let token = store.create();

    let state = engine
        .run("Jane Doe".into(), store.clone(), token.clone())
        .await;

    // Stopped on sufficiency during iteration 2, not on the cap.
    assert_eq!(state.retrieval_count, 2);
    assert_eq!(state.retrieved_data.len(), 10);
    assert!(state.log.iter().any(|l| l.contains("sufficient data collected")));

    // The stream closes with a non-empty report followed by the end marker.
    let events = store.read_from(&token, 0).unwrap();
    let n = events.len();
    assert_eq!(events[n - 1], SessionEvent::End);
    match &events[n - 2] {
        SessionEvent::Report(text) => assert!(text.contains("Jane Doe")),
        other => panic!("Expected report before end marker, got {other:?}"),
    }
    assert!(state.log.iter().any(|l| l.contains("approved")));
}

/// Scenario B: retrieval returns nothing and the analyst gives up
/// immediately; the loop ends after exactly one iteration and the cleaner's
/// fallback produces the single zero-confidence error profile.
#[tokio::test]
async fn scenario_b_stops_after_one_iteration_with_error_profile() {
    let mock = Arc::new(MockLlmProvider::new());
    mock.queue_json(json!({"entities": ["Jane Doe"]}));
    mock.queue_json(json!({"tool_name": "web_search", "query": "Jane Doe"}));
    mock.queue_json(json!({"analysis": "Nothing found.", "follow_up_queries": []}));
    // The cleaner fallback fires without an LLM call (no content); writer and
    // judge still run.
    mock.queue_text("Report over an error profile.");
    mock.queue_json(json!({"is_accurate": true}));

    let engine = make_engine(
        mock,
        StubSearch {
            items_per_search: 0,
            empty_content: false,
        },
    );
    let store = Arc::new(SessionStore::new());
    let token = store.create();

    let state = engine
        .run("Jane Doe".into(), store.clone(), token.clone())
        .await;

    assert_eq!(state.retrieval_count, 1);
    assert!(state
        .log
        .iter()
        .any(|l| l.contains("no follow-up queries left to pursue")));

    let profiles = &state.cleaned_data.as_ref().unwrap().profiles;
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].confidence_score, 0.0);
    assert_eq!(profiles[0].profile_name, "Error during cleaning");
    assert!(profiles[0].summary.contains("Failed to clean data"));

    let events = store.read_from(&token, 0).unwrap();
    assert_eq!(events.last(), Some(&SessionEvent::End));
}

/// Scenario C: the analyst always has more to ask and the data never crosses
/// the sufficiency threshold; the hard cap ends the loop at exactly 15.
#[tokio::test]
async fn scenario_c_stops_at_hard_cap() {
    let mock = Arc::new(MockLlmProvider::new());
    mock.queue_json(json!({"entities": ["Jane Doe"]}));
    for i in 0..15 {
        mock.queue_json(json!({"tool_name": "web_search", "query": format!("angle {i}")}));
        mock.queue_json(json!({
            "analysis": "Still inconclusive.",
            "follow_up_queries": [format!("angle {}", i + 1)]
        }));
    }
    // Cleaner falls back (all content empty), writer and judge run.
    mock.queue_text("Report over thin data.");
    mock.queue_json(json!({"is_accurate": true}));

    let engine = make_engine(
        mock,
        StubSearch {
            items_per_search: 1,
            empty_content: true,
        },
    );
    let store = Arc::new(SessionStore::new());
    let token = store.create();

    let state = engine
        .run("Jane Doe".into(), store.clone(), token.clone())
        .await;

    assert_eq!(state.retrieval_count, 15);
    assert_eq!(state.retrieved_data.len(), 15);
    assert!(state.log.iter().any(|l| l.contains("retrieval cap reached")));

    // One step log entry per iteration: the count moved by exactly 1 each time.
    for step in 1..=15 {
        assert!(state
            .log
            .iter()
            .any(|l| l.contains(&format!("Investigation step #{step}"))));
    }

    let events = store.read_from(&token, 0).unwrap();
    assert_eq!(events.last(), Some(&SessionEvent::End));
}

/// Draining the session in offset-based chunks (as the delivery subsystem
/// does) yields the same ordered sequence as reading it whole.
#[tokio::test]
async fn chunked_draining_preserves_event_order() {
    let mock = Arc::new(MockLlmProvider::new());
    mock.queue_json(json!({"entities": ["Jane Doe"]}));
    mock.queue_json(json!({"tool_name": "web_search", "query": "Jane Doe"}));
    mock.queue_json(json!({"analysis": "done", "follow_up_queries": []}));
    queue_tail(&mock);

    let engine = make_engine(
        mock,
        StubSearch {
            items_per_search: 2,
            empty_content: false,
        },
    );
    let store = Arc::new(SessionStore::new());
    let token = store.create();
    engine
        .run("Jane Doe".into(), store.clone(), token.clone())
        .await;

    let whole = store.read_from(&token, 0).unwrap();

    let mut drained = Vec::new();
    let mut offset = 0;
    loop {
        let chunk = store.read_from(&token, offset).unwrap();
        if chunk.is_empty() {
            break;
        }
        offset += chunk.len();
        let done = chunk.contains(&SessionEvent::End);
        drained.extend(chunk);
        if done {
            break;
        }
    }

    assert_eq!(drained, whole);
    assert_eq!(drained.last(), Some(&SessionEvent::End));
}
