//! Rectifier Service Library
//!
//! Splits documents into bounded chunks, sends each chunk through an
//! AI-backed correction capability, converts PDFs to markdown, and reports
//! progress as a stream of `data: <json>` frames.

pub mod api;
pub mod capabilities;
pub mod chunkers;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod types;

pub use chunkers::{chunk_by_size, join_chunks, Chunker, SizeChunker};
pub use error::{ServiceError, ServiceResult};
pub use events::{format_event, parse_event, FrameDecoder, ProgressEvent};
pub use pipeline::{assemble_markdown, convert_document, rectify_document};
pub use progress::{ProgressObserver, ProgressState, RectifyProgress};
pub use types::{Chunk, RectifiedChunk, ServiceConfig};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::capabilities::{Extractor, Rectifier, RectifierFactory, RectifierOptions};
    pub use crate::chunkers::{Chunker, SizeChunker};
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::pipeline::*;
    pub use crate::progress::*;
    pub use crate::types::*;
}

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Look-back window for chunk boundaries, as a fraction `1/n` of the chunk size
pub const DEFAULT_LOOKBACK_DIVISOR: usize = 5;

/// Model used when neither request nor configuration names one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Frames buffered per stream before the producer waits
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// Largest accepted request body (50MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
