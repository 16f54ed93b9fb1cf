//! PDF decoder using the `pdf-extract` crate.
//!
//! `pdf-extract` returns all pages as a single string with form feeds
//! between pages; those are counted for the page total and then flattened
//! into plain line breaks.

use crate::library::error::{LibraryError, LibraryResult};
use crate::library::parser::{ContentDecoder, DecodedText};

/// PDF decoder backed by `pdf-extract`.
pub struct PdfDecoder;

impl ContentDecoder for PdfDecoder {
    fn decode(&self, data: &[u8]) -> LibraryResult<DecodedText> {
        let raw =
            pdf_extract::extract_text_from_mem(data).map_err(|e| LibraryError::ParseError {
                format: "pdf".into(),
                message: e.to_string(),
            })?;
        Ok(flatten_pages(&raw))
    }
}

/// Count pages on form feeds and join them into one line-oriented text.
fn flatten_pages(raw: &str) -> DecodedText {
    let pages: Vec<&str> = raw
        .split('\x0C')
        .filter(|p| !p.trim().is_empty())
        .collect();
    let page_count = pages.len().max(1);
    let text = pages
        .iter()
        .map(|p| p.trim_matches('\n'))
        .collect::<Vec<_>>()
        .join("\n\n");

    DecodedText {
        text,
        page_count: Some(page_count),
    }
}
