//! Vision OCR backend: transcribe each page with a vision language model.
//!
//! Each page becomes one chat request: the transcription prompt as the
//! system turn, then the page PNG as an image attachment with empty text.
//! Provider errors on a single page are page failures; the next page is
//! still attempted with the same provider.

use crate::error::{OcrError, Pdf2SlidesError};
use crate::output::PageImage;
use crate::pipeline::encode::encode_for_vision;
use crate::pipeline::ocr::{OcrEngine, OcrEngineFactory, PageProgress};
use crate::prompts::OCR_TRANSCRIPTION_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Starts [`VisionOcrEngine`]s over a shared provider.
#[derive(Clone)]
pub struct VisionOcrFactory {
    provider: Arc<dyn LLMProvider>,
    max_tokens: usize,
}

impl VisionOcrFactory {
    pub fn new(provider: Arc<dyn LLMProvider>, max_tokens: usize) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }
}

#[async_trait]
impl OcrEngineFactory for VisionOcrFactory {
    async fn create(&self) -> Result<Box<dyn OcrEngine>, Pdf2SlidesError> {
        Ok(Box::new(VisionOcrEngine {
            provider: Some(Arc::clone(&self.provider)),
            max_tokens: self.max_tokens,
        }))
    }
}

/// One run's handle on the vision provider.
pub struct VisionOcrEngine {
    provider: Option<Arc<dyn LLMProvider>>,
    max_tokens: usize,
}

#[async_trait]
impl OcrEngine for VisionOcrEngine {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(
        &mut self,
        image: &PageImage,
        progress: PageProgress<'_>,
    ) -> Result<String, OcrError> {
        let page = image.page;
        let provider = self.provider.as_ref().ok_or_else(|| OcrError::EngineFailed {
            page,
            detail: "engine already terminated".into(),
        })?;

        let image_data = encode_for_vision(&image.image).map_err(|e| OcrError::PageFailed {
            page,
            detail: format!("PNG encoding failed: {}", e),
        })?;
        progress(0.1);

        let messages = vec![
            ChatMessage::system(OCR_TRANSCRIPTION_PROMPT),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let start = Instant::now();
        let response = provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| OcrError::PageFailed {
                page,
                detail: e.to_string(),
            })?;

        debug!(
            "Vision OCR page {}: {} input tokens, {} output tokens, {:?}",
            page,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        progress(1.0);
        Ok(response.content)
    }

    fn terminate(&mut self) {
        self.provider = None;
    }
}
