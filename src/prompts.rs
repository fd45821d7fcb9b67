//! Prompts and the response schema for presentation generation.
//!
//! Everything the remote model is told lives here so prompt regressions can
//! be caught by unit tests without calling a model.

use serde_json::{json, Value};

/// System prompt for the vision OCR backend: plain transcription, no markup.
pub const OCR_TRANSCRIPTION_PROMPT: &str = r#"You are an OCR engine. Transcribe every piece of text visible in the page image.

Rules:
1. Output plain text only. No Markdown, no commentary, no code fences.
2. Keep the reading order a human would follow.
3. Put a blank line between paragraphs and between separate blocks of text.
4. Keep list items and table cells on their own lines.
5. Skip page numbers and running headers or footers.
6. If the page contains no legible text, output nothing."#;

/// Build the generation prompt for the full extracted text.
///
/// The whole text is embedded between `---` delimiters. The model is told to
/// use all of it; summarising or dropping material is explicitly ruled out.
pub fn presentation_prompt(text: &str) -> String {
    format!(
        "Based on the following text extracted from a document, create a structured presentation.\n\
The presentation should have a main title and a series of slides. \
Each slide must have a title and content in the form of bullet points.\n\
The entire text must be used without summarization or omission. \
Organize all information logically into distinct slides.\n\
\n\
Extracted Text:\n\
---\n\
{text}\n\
---\n\
\n\
Generate the presentation based on the schema provided."
    )
}

/// System instruction for providers without native schema enforcement.
///
/// The schema is inlined so the model sees the exact shape it must return.
pub fn json_only_instruction(schema: &Value) -> String {
    format!(
        "You are a presentation writer. Respond with a single JSON object and nothing else: \
no prose, no markdown fences. The object must conform to this JSON schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
    )
}

/// Response schema: `{ title: string, slides: [{ title: string, content: [string] }] }`.
///
/// Expressed in the OpenAPI subset accepted by Gemini's `responseSchema`.
pub fn presentation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "The main title of the presentation. This should be a concise summary of the entire document."
            },
            "slides": {
                "type": "ARRAY",
                "description": "An array of slide objects, each representing a slide in the presentation.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "The title of the individual slide. It should represent a key topic or section from the text."
                        },
                        "content": {
                            "type": "ARRAY",
                            "description": "An array of strings, where each string is a bullet point summarizing a key piece of information for this slide.",
                            "items": { "type": "STRING" }
                        }
                    },
                    "required": ["title", "content"]
                }
            }
        },
        "required": ["title", "slides"]
    })
}
