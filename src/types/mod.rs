//! Core types for the rectification service.

mod chunk;
mod config;
mod request;

pub use chunk::{Chunk, Document, DocumentMeta, RectifiedChunk};
pub use config::ServiceConfig;
pub use request::{
    ConvertJob, ConvertRequest, DocumentResponse, HealthResponse, RectifyJob, RectifyRequest,
    DEFAULT_PDF_FILENAME, DEFAULT_TEXT_FILENAME,
};
