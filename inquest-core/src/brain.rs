//! Brain module — LLM provider abstraction and strict-shape invocation.
//!
//! Defines the `LlmProvider` trait for model-agnostic completions, the
//! `Brain` wrapper that renders prompts and parses each stage's expected
//! output shape, and a `MockLlmProvider` for tests.

use crate::config::{LlmConfig, RetryConfig};
use crate::error::LlmError;
use crate::providers::with_retry;
use crate::types::{CompletionRequest, CompletionResponse, Message, TokenUsage};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return the default model name for this provider.
    fn model_name(&self) -> &str;
}

/// The Brain wraps an [`LlmProvider`] with request defaults, transient-error
/// retry, and a strict parse step for structured stage outputs.
///
/// Any response whose shape does not deserialize into the stage's expected
/// type is an [`LlmError::ResponseParse`] — indistinguishable, for callers,
/// from a failed call. Partial acceptance is never attempted.
pub struct Brain {
    provider: Arc<dyn LlmProvider>,
    max_tokens: usize,
    temperature: f32,
    retry: RetryConfig,
}

impl Brain {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry: config.retry.clone(),
        }
    }

    /// Complete a single-turn prompt and return the raw text.
    pub async fn complete_text(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, LlmError> {
        let response = self.invoke(prompt, model).await?;
        Ok(response.message.content)
    }

    /// Complete a single-turn prompt and strictly parse the response as `T`.
    ///
    /// Markdown code fences around the JSON body are tolerated (models add
    /// them even when told not to); everything else about the shape is not.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<T, LlmError> {
        let response = self.invoke(prompt, model).await?;
        let text = strip_code_fences(&response.message.content);
        serde_json::from_str(text).map_err(|e| LlmError::ResponseParse {
            message: format!("{e} in response: {}", truncate(text, 200)),
        })
    }

    async fn invoke(
        &self,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest {
            messages: vec![Message::user(prompt)],
            model: model.map(str::to_string),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = with_retry(&self.retry, || {
            let request = request.clone();
            async move { self.provider.complete(request).await }
        })
        .await?;
        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM completion finished"
        );
        Ok(response)
    }
}

/// Strip a leading/trailing markdown code fence from a model response.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// A mock LLM provider for tests: returns queued responses (or errors) in order.
pub struct MockLlmProvider {
    model: String,
    responses: std::sync::Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: std::sync::Mutex<Vec<CompletionRequest>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: std::sync::Mutex::new(VecDeque::new()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queue a raw text response.
    pub fn queue_text(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Self::text_response(text)));
    }

    /// Queue a JSON response (serialized to text, as a real model would emit it).
    pub fn queue_json(&self, value: serde_json::Value) {
        self.queue_text(&value.to_string());
    }

    /// Queue an error for the next `complete` call.
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Every request seen so far, in order.
    pub fn request_log(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
        }
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(Self::text_response("No queued responses.")),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
