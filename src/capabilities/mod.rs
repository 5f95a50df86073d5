//! External capabilities the pipeline depends on.
//!
//! The orchestrators only see these traits. Concrete implementations are
//! constructed once at start-up and handed to the HTTP layer through
//! `AppState`, so tests swap in fakes without touching globals.

mod llm_rectifier;
mod pdf_extractor;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::types::{Chunk, RectifiedChunk};

pub use llm_rectifier::{LlmRectifier, LlmRectifierFactory};
pub use pdf_extractor::{text_to_markdown, PdfExtractor};

/// Corrects the text of a single chunk.
#[async_trait]
pub trait Rectifier: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Returns the corrected content for `chunk`, carrying the same index.
    async fn rectify_chunk(&self, chunk: &Chunk) -> anyhow::Result<RectifiedChunk>;
}

/// Per-request rectifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectifierOptions {
    pub model: String,
    pub verbose: bool,
}

/// Builds a rectifier for one request.
pub trait RectifierFactory: Send + Sync {
    fn create(&self, options: RectifierOptions) -> ServiceResult<Arc<dyn Rectifier>>;
}

/// Turns a binary document into Markdown.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn convert_to_markdown(&self, bytes: Vec<u8>) -> anyhow::Result<String>;
}
