//! Chunking strategies for document text.

mod base;
mod size_chunker;

pub use base::{join_chunks, Chunker, CHUNK_JOIN_SEPARATOR};
pub use size_chunker::{chunk_by_size, SizeChunker};
