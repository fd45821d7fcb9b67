//! Presentation generation: one schema-constrained model call, then local
//! validation of whatever came back.
//!
//! The model is asked for JSON matching [`presentation_schema`], but the
//! reply is never trusted. It goes through three gates:
//!
//! 1. fence stripping and JSON parsing (failure → `MalformedResponse`)
//! 2. shape validation against the domain model (failure → `SchemaViolation`)
//! 3. conversion into [`Presentation`]
//!
//! Every failure, including the call itself, becomes
//! [`Pdf2SlidesError::Generation`]. Its message is the generic user-facing
//! one; the underlying detail is logged at `error` and kept on the value.

use crate::config::PipelineConfig;
use crate::error::{GenerationErrorKind, Pdf2SlidesError};
use crate::output::{Presentation, Slide};
use crate::pipeline::llm::{GenerativeModel, StructuredRequest};
use crate::pipeline::postprocess::strip_json_fences;
use crate::prompts::{presentation_prompt, presentation_schema};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Turns aggregated document text into a validated [`Presentation`].
#[derive(Clone)]
pub struct PresentationGenerator {
    model: Arc<dyn GenerativeModel>,
    model_id: String,
    temperature: Option<f32>,
    max_tokens: usize,
}

impl PresentationGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>, model_id: impl Into<String>) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            temperature: None,
            max_tokens: 8192,
        }
    }

    /// Take the model id and sampling settings from `config`.
    pub fn from_config(model: Arc<dyn GenerativeModel>, config: &PipelineConfig) -> Self {
        Self {
            model,
            model_id: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// The request sent for `text`.
    pub fn request_for(&self, text: &str) -> StructuredRequest {
        let mut request =
            StructuredRequest::new(&self.model_id, presentation_prompt(text), presentation_schema());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }

    /// Make exactly one model call and validate the reply.
    pub async fn generate(&self, text: &str) -> Result<Presentation, Pdf2SlidesError> {
        let request = self.request_for(text);
        info!(
            "Generating presentation with {} ({}) from {} chars",
            self.model_id,
            self.model.name(),
            text.len()
        );

        let body = self.model.generate(&request).await.map_err(|e| {
            error!("Generation call failed: {}", e);
            Pdf2SlidesError::generation(GenerationErrorKind::Transport, e.to_string())
        })?;

        let presentation = parse_presentation(&body).inspect_err(|e| {
            if let Pdf2SlidesError::Generation { kind, detail } = e {
                error!("Generation reply rejected ({:?}): {}", kind, detail);
            }
        })?;

        info!(
            "Generated '{}' with {} slides",
            presentation.title,
            presentation.slides.len()
        );
        Ok(presentation)
    }
}

/// Parse and validate a raw model reply.
pub fn parse_presentation(body: &str) -> Result<Presentation, Pdf2SlidesError> {
    let json = strip_json_fences(body);
    let value: Value = serde_json::from_str(&json).map_err(|e| {
        Pdf2SlidesError::generation(
            GenerationErrorKind::MalformedResponse,
            format!("{}: {}", e, preview(&json)),
        )
    })?;
    validate_presentation(&value)
}

/// Check `value` against the presentation shape and build the domain value.
fn validate_presentation(value: &Value) -> Result<Presentation, Pdf2SlidesError> {
    let violation = |detail: String| {
        Pdf2SlidesError::generation(GenerationErrorKind::SchemaViolation, detail)
    };

    let obj = value
        .as_object()
        .ok_or_else(|| violation(format!("top level is {}, expected object", type_name(value))))?;

    let title = match obj.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => return Err(violation("`title` is empty".into())),
        Some(other) => {
            return Err(violation(format!("`title` is {}, expected string", type_name(other))))
        }
        None => return Err(violation("`title` is missing".into())),
    };

    let raw_slides = match obj.get("slides") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(violation(format!("`slides` is {}, expected array", type_name(other))))
        }
        None => return Err(violation("`slides` is missing".into())),
    };

    let slides = raw_slides
        .iter()
        .enumerate()
        .map(|(i, s)| validate_slide(i, s).map_err(&violation))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Presentation { title, slides })
}

fn validate_slide(index: usize, value: &Value) -> Result<Slide, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("slide {} is {}, expected object", index, type_name(value)))?;

    let title = match obj.get("title") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(format!(
                "slide {} `title` is {}, expected string",
                index,
                type_name(other)
            ))
        }
        None => return Err(format!("slide {} `title` is missing", index)),
    };

    let content = match obj.get("content") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(j, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    format!(
                        "slide {} bullet {} is {}, expected string",
                        index,
                        j,
                        type_name(item)
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(format!(
                "slide {} `content` is {}, expected array",
                index,
                type_name(other)
            ))
        }
        None => return Err(format!("slide {} `content` is missing", index)),
    };

    Ok(Slide { title, content })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First 200 chars of a reply, for diagnostics.
fn preview(s: &str) -> String {
    let mut out: String = s.chars().take(200).collect();
    if out.len() < s.len() {
        out.push('…');
    }
    out
}
