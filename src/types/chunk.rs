//! Chunk and document type definitions.

use serde::{Deserialize, Serialize};

/// A contiguous slice of a document's text.
///
/// `index` is the chunk's position in the original document and is the only
/// ordering key used downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Order of this chunk within its document (0-indexed)
    pub index: usize,

    /// The exact text of the slice
    pub content: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
        }
    }

    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// The corrected counterpart of a [`Chunk`], produced one-to-one by a rectifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectifiedChunk {
    /// Index of the chunk this was produced from
    pub index: usize,

    /// Corrected text
    pub rectified_content: String,
}

impl RectifiedChunk {
    pub fn new(index: usize, rectified_content: impl Into<String>) -> Self {
        Self {
            index,
            rectified_content: rectified_content.into(),
        }
    }
}

/// Optional metadata carried alongside a document for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Name of the uploaded file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Backing correction model requested by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Chunk size requested by the caller, in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

/// An immutable piece of content to process, owned for the request lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    meta: DocumentMeta,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            meta: DocumentMeta::default(),
        }
    }

    /// Attach metadata.
    pub fn with_meta(mut self, meta: DocumentMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Take the text out, dropping the metadata.
    pub fn into_content(self) -> String {
        self.content
    }

    /// Filename to echo back in responses.
    pub fn filename(&self) -> &str {
        self.meta.filename.as_deref().unwrap_or_default()
    }
}
