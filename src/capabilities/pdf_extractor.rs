//! PDF text extraction.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::Extractor;

const PDF_MAGIC: &[u8] = b"%PDF";

lazy_static! {
    static ref EXCESS_BLANK_LINES: Regex =
        Regex::new(r"\n{3,}").expect("blank line pattern is valid");
}

/// Extracts the text layer of a PDF and lays it out as Markdown paragraphs.
///
/// Image-only pages have no text layer and contribute nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn convert_to_markdown(&self, bytes: Vec<u8>) -> Result<String> {
        if !bytes.starts_with(PDF_MAGIC) {
            bail!("input is not a PDF document");
        }

        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .context("PDF extraction task aborted")?
            .map_err(|e| anyhow!("could not read PDF: {e}"))?;

        debug!(bytes = size, chars = text.len(), "Extracted PDF text layer");
        Ok(text_to_markdown(&text))
    }
}

/// Page breaks become paragraph breaks, trailing spaces go, and runs of blank
/// lines collapse to one.
pub fn text_to_markdown(text: &str) -> String {
    let text = text.replace('\r', "").replace('\u{c}', "\n\n");
    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    EXCESS_BLANK_LINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
