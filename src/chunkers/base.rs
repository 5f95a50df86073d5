//! Base trait for all chunkers.

use crate::error::ServiceResult;
use crate::types::Chunk;

/// Separator used to put chunk contents back together.
///
/// Chunkers in this crate emit contiguous slices, so joining with the empty
/// separator reproduces the input byte-for-byte.
pub const CHUNK_JOIN_SEPARATOR: &str = "";

/// The core trait that all chunkers must implement.
///
/// A chunker splits document text into an ordered sequence of bounded-size
/// units suitable for a per-chunk external transformation.
pub trait Chunker: Send + Sync {
    /// Get the name of this chunker.
    fn name(&self) -> &'static str;

    /// Split `content` into chunks of at most `chunk_size` characters.
    ///
    /// # Errors
    /// Returns [`crate::error::ServiceError::Configuration`] when `chunk_size` is zero.
    fn chunk(&self, content: &str, chunk_size: usize) -> ServiceResult<Vec<Chunk>>;

    /// Get the description of this chunker.
    fn description(&self) -> &'static str {
        "A text chunker"
    }
}

/// Reassemble chunk contents in index order using the chunker join rule.
pub fn join_chunks(chunks: &[Chunk]) -> String {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);
    ordered
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_JOIN_SEPARATOR)
}
