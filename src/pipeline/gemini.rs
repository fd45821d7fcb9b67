//! Gemini `generateContent` over plain HTTPS.
//!
//! Gemini is the only backend that takes the response schema natively, so
//! it gets a direct client instead of going through a chat abstraction:
//! `generationConfig.responseSchema` makes the server constrain the reply.
//!
//! Wire shape:
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: <key>
//! { "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
//!   "generationConfig": { "responseMimeType", "responseSchema",
//!                         "temperature"?, "maxOutputTokens" } }
//! ```
//!
//! The reply text is the concatenation of `candidates[0].content.parts[*].text`.

use crate::config::PipelineConfig;
use crate::error::{ModelError, Pdf2SlidesError};
use crate::pipeline::llm::{GenerativeModel, StructuredRequest};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::debug;

/// Direct client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiModel {
    /// Build a client from the pipeline configuration. Requires `api_key`.
    pub fn new(config: &PipelineConfig) -> Result<Self, Pdf2SlidesError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Pdf2SlidesError::ProviderNotConfigured {
                hint: "Set an API key (--api-key or GEMINI_API_KEY).".into(),
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Pdf2SlidesError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .finish()
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &StructuredRequest) -> Result<String, ModelError> {
        let start = Instant::now();
        let url = self.endpoint(&request.model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ModelError::EmptyResponse(format!("unparseable envelope: {}", e)))?;
        let text = extract_text(&value)?;
        debug!("Gemini replied with {} chars in {:?}", text.len(), start.elapsed());
        Ok(text)
    }
}

/// JSON body for one `generateContent` call.
fn request_body(request: &StructuredRequest) -> Value {
    let mut generation_config = json!({
        "responseMimeType": request.response_mime_type,
        "responseSchema": request.response_schema,
        "maxOutputTokens": request.max_tokens,
    });
    if let Some(t) = request.temperature {
        generation_config["temperature"] = json!(t);
    }

    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": generation_config,
    })
}

/// Pull the reply text out of a `generateContent` response envelope.
fn extract_text(value: &Value) -> Result<String, ModelError> {
    let candidate = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| {
            let reason = value
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            ModelError::EmptyResponse(reason.to_string())
        })?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("empty candidate");
        return Err(ModelError::EmptyResponse(reason.to_string()));
    }
    Ok(text)
}
