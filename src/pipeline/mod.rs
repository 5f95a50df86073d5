//! Orchestrators that drive the external capabilities.

mod convert;
mod rectify;

pub use convert::{
    convert_document, CONVERSION_PHASES, PHASE_EXTRACTING, PHASE_GENERATING, PHASE_LOADING,
};
pub use rectify::rectify_document;

use crate::types::RectifiedChunk;

/// Separator between assembled sections: one blank line.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Join sections in order with a blank line between them.
pub fn assemble_markdown<I, S>(sections: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, section) in sections.into_iter().enumerate() {
        if i > 0 {
            out.push_str(SECTION_SEPARATOR);
        }
        out.push_str(section.as_ref());
    }
    out
}

/// Final markdown for a rectified document.
pub fn assemble_rectified(chunks: &[RectifiedChunk]) -> String {
    assemble_markdown(chunks.iter().map(|c| c.rectified_content.as_str()))
}
