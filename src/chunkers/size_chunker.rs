//! Size-bounded chunker that prefers paragraph and sentence breaks.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::base::Chunker;
use crate::error::{ServiceError, ServiceResult};
use crate::types::Chunk;
use crate::DEFAULT_LOOKBACK_DIVISOR;

lazy_static! {
    /// A blank line, allowing stray spaces or tabs on it.
    static ref PARAGRAPH_BREAK: Regex =
        Regex::new(r"\n[ \t]*\n").expect("paragraph break pattern is valid");
}

/// Chunker that cuts text into slices of at most `chunk_size` characters.
///
/// A cut is chosen, in order of preference:
/// 1. After the last paragraph break inside the look-back window
/// 2. At the last sentence boundary (UAX #29) inside the look-back window
/// 3. After the last whitespace before the cutoff
/// 4. At the end of the unbroken run when the whole slice is one run,
///    producing an oversized chunk instead of cutting mid-word
///
/// The look-back window is the last `chunk_size / lookback_divisor`
/// characters before the cutoff (at least one). Chunks are contiguous
/// slices, so concatenating them in order gives back the input exactly.
pub struct SizeChunker {
    lookback_divisor: usize,
}

impl SizeChunker {
    /// Create a chunker with the default look-back window (a fifth of the chunk).
    pub fn new() -> Self {
        Self {
            lookback_divisor: DEFAULT_LOOKBACK_DIVISOR,
        }
    }

    /// Create a chunker whose window is `chunk_size / divisor` characters.
    pub fn with_lookback_divisor(divisor: usize) -> Self {
        Self {
            lookback_divisor: divisor.max(1),
        }
    }

    fn lookback(&self, chunk_size: usize) -> usize {
        (chunk_size / self.lookback_divisor).max(1)
    }

    /// Pick the end (character index) of the chunk starting at `start`.
    ///
    /// Only called when more than `chunk_size` characters remain.
    fn find_cut(&self, content: &str, offsets: &[usize], start: usize, chunk_size: usize) -> usize {
        let limit = start + chunk_size;
        let window_start = limit
            .saturating_sub(self.lookback(chunk_size))
            .max(start + 1);

        let base = offsets[start];
        let lo = offsets[window_start];
        let hi = offsets[limit];

        let boundary = paragraph_break(content, lo, hi).or_else(|| sentence_break(content, base, lo, hi));
        if let Some(byte) = boundary {
            return offsets.binary_search(&byte).unwrap_or_else(|i| i);
        }

        word_break(content, offsets, start, limit)
    }
}

impl Default for SizeChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset just past the last blank line in `content[lo..hi]`.
fn paragraph_break(content: &str, lo: usize, hi: usize) -> Option<usize> {
    PARAGRAPH_BREAK
        .find_iter(&content[lo..hi])
        .last()
        .map(|m| lo + m.end())
}

/// Byte offset of the last sentence start in `[lo, hi)`, excluding `base`.
fn sentence_break(content: &str, base: usize, lo: usize, hi: usize) -> Option<usize> {
    content[base..hi]
        .split_sentence_bound_indices()
        .map(|(i, _)| base + i)
        .filter(|&b| b >= lo && b > base)
        .last()
}

/// Character index to cut at when no preferred boundary exists.
fn word_break(content: &str, offsets: &[usize], start: usize, limit: usize) -> usize {
    let total = offsets.len() - 1;
    let is_space = |ci: usize| {
        content[offsets[ci]..]
            .chars()
            .next()
            .map_or(false, char::is_whitespace)
    };

    if is_space(limit) || is_space(limit - 1) {
        return limit;
    }

    // Back off to the start of the run that straddles the cutoff.
    if let Some(ci) = (start + 1..limit).rev().find(|&ci| is_space(ci - 1)) {
        return ci;
    }

    // The slice is a single indivisible run: keep it whole.
    (limit..total).find(|&ci| is_space(ci)).unwrap_or(total)
}

impl Chunker for SizeChunker {
    fn name(&self) -> &'static str {
        "size"
    }

    fn description(&self) -> &'static str {
        "Splits text into bounded slices at paragraph, sentence or word breaks"
    }

    fn chunk(&self, content: &str, chunk_size: usize) -> ServiceResult<Vec<Chunk>> {
        if chunk_size == 0 {
            return Err(ServiceError::Configuration(
                "chunk size must be greater than zero".into(),
            ));
        }
        if content.is_empty() {
            return Ok(vec![]);
        }

        // Byte offset of every char boundary, including the end of the text.
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = if total - start <= chunk_size {
                total
            } else {
                self.find_cut(content, &offsets, start, chunk_size)
            };

            chunks.push(Chunk::new(
                chunks.len(),
                &content[offsets[start]..offsets[end]],
            ));
            start = end;
        }

        Ok(chunks)
    }
}

/// Split `content` with the default [`SizeChunker`].
pub fn chunk_by_size(content: &str, chunk_size: usize) -> ServiceResult<Vec<Chunk>> {
    SizeChunker::new().chunk(content, chunk_size)
}
