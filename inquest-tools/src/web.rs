//! Web search retrieval tool.
//!
//! Searches the DuckDuckGo instant answers API — no API key required, and
//! queries go directly to DuckDuckGo rather than through a third party.

use async_trait::async_trait;
use inquest_core::error::ToolError;
use inquest_core::tools::RetrievalTool;
use inquest_core::types::RetrievedItem;
use std::time::Duration;

/// Search the web using DuckDuckGo instant answers.
///
/// Returns one [`RetrievedItem`] per abstract or related topic found.
pub struct WebSearchTool {
    max_results: usize,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self { max_results: 5 }
    }

    /// Convert a DuckDuckGo instant-answer response into retrieved items.
    fn parse_results(&self, body: &serde_json::Value) -> Vec<RetrievedItem> {
        let mut items = Vec::new();

        if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() {
                let source = body
                    .get("AbstractSource")
                    .and_then(|v| v.as_str())
                    .unwrap_or("web_search");
                items.push(RetrievedItem::new(
                    "web_search",
                    format!("[{source}] {abstract_text}"),
                ));
            }
        }

        if let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
            for topic in topics {
                if items.len() >= self.max_results {
                    break;
                }
                if let Some(text) = topic.get("Text").and_then(|v| v.as_str()) {
                    if !text.is_empty() {
                        items.push(RetrievedItem::new("web_search", text));
                    }
                }
            }
        }

        items
    }
}

#[async_trait]
impl RetrievalTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information about an entity. Returns abstracts and \
         related snippets from search results. The broadest available source."
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Inquest/0.3")
            .build()
            .map_err(|e| ToolError::SearchFailed {
                name: "web_search".into(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            urlencoding::encode(query)
        );

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::SearchFailed {
                name: "web_search".into(),
                message: format!("Search request failed: {e}"),
            })?;

        let body: serde_json::Value =
            response.json().await.map_err(|e| ToolError::SearchFailed {
                name: "web_search".into(),
                message: format!("Failed to parse search response: {e}"),
            })?;

        let items = self.parse_results(&body);
        tracing::debug!(query = %query, hits = items.len(), "Web search finished");
        Ok(items)
    }
}
