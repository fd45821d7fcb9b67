//! The generative-model seam.
//!
//! [`GenerativeModel`] is the one call the generator makes: send a prompt
//! plus a response schema, get back the reply body as text. Two backends
//! implement it:
//!
//! - [`crate::pipeline::gemini::GeminiModel`] speaks the Gemini REST API and
//!   enforces the schema server-side (`responseSchema`).
//! - [`ProviderModel`] wraps any `edgequake-llm` provider. Those providers
//!   have no schema field, so the schema is inlined into a system message
//!   and the reply is validated afterwards like any other.
//!
//! No retries happen at this layer. A failed call is a failed run.

use crate::error::ModelError;
use crate::prompts::json_only_instruction;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// MIME type requested for every structured reply.
pub const JSON_MIME_TYPE: &str = "application/json";

/// One schema-constrained generation request.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// The full prompt text.
    pub prompt: String,
    /// Always [`JSON_MIME_TYPE`].
    pub response_mime_type: String,
    /// Shape the reply must take.
    pub response_schema: Value,
    /// `None` leaves the backend default in place.
    pub temperature: Option<f32>,
    pub max_tokens: usize,
}

impl StructuredRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_mime_type: JSON_MIME_TYPE.to_string(),
            response_schema: schema,
            temperature: None,
            max_tokens: 8192,
        }
    }
}

/// A remote model that answers a [`StructuredRequest`] with a JSON body.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Issue exactly one request and return the raw reply text.
    async fn generate(&self, request: &StructuredRequest) -> Result<String, ModelError>;
}

/// [`GenerativeModel`] over an `edgequake-llm` chat provider.
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl GenerativeModel for ProviderModel {
    fn name(&self) -> &str {
        "edgequake-llm"
    }

    async fn generate(&self, request: &StructuredRequest) -> Result<String, ModelError> {
        let start = Instant::now();
        let messages = build_messages(request);
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        debug!(
            "Generation: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ModelError::EmptyResponse(
                "provider returned empty content".into(),
            ));
        }
        Ok(response.content)
    }
}

/// System message carrying the schema, then the prompt as the user turn.
fn build_messages(request: &StructuredRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(json_only_instruction(&request.response_schema)),
        ChatMessage::user(request.prompt.as_str()),
    ]
}

fn build_options(request: &StructuredRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: request.temperature,
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}
