//! Byte-to-text decoders and format detection.
//!
//! Each supported format (plain text, PDF, EPUB, HTML) implements
//! `ContentDecoder`, producing one flattened text stream. The `decoder_for()`
//! factory returns the correct decoder for a given format.

pub mod epub;
pub mod html;
pub mod pdf;

use std::path::Path;

use crate::library::error::LibraryResult;
use crate::library::model::ContentFormat;

/// Text extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Line-oriented text, ready for segmentation.
    pub text: String,
    /// Page count, for formats that have pages.
    pub page_count: Option<usize>,
}

impl DecodedText {
    pub fn plain(text: String) -> Self {
        Self {
            text,
            page_count: None,
        }
    }
}

/// Trait for format-specific decoders.
pub trait ContentDecoder {
    /// Decode raw bytes into a flattened text stream.
    fn decode(&self, data: &[u8]) -> LibraryResult<DecodedText>;
}

/// Get the appropriate decoder for a content format.
pub fn decoder_for(format: ContentFormat) -> Box<dyn ContentDecoder> {
    match format {
        ContentFormat::Html => Box::new(html::HtmlDecoder),
        ContentFormat::Pdf => Box::new(pdf::PdfDecoder),
        ContentFormat::Epub => Box::new(epub::EpubDecoder),
        ContentFormat::PlainText => Box::new(PlainTextDecoder),
    }
}

/// Detect the content format from a file extension.
pub fn detect_format(path: &Path) -> Option<ContentFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "html" | "htm" | "xhtml" => Some(ContentFormat::Html),
        "pdf" => Some(ContentFormat::Pdf),
        "epub" => Some(ContentFormat::Epub),
        "txt" | "text" | "md" | "log" => Some(ContentFormat::PlainText),
        _ => None,
    }
}

/// Direct UTF-8 decode with lossy replacement.
struct PlainTextDecoder;

impl ContentDecoder for PlainTextDecoder {
    fn decode(&self, data: &[u8]) -> LibraryResult<DecodedText> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let text = String::from_utf8_lossy(data).replace("\r\n", "\n");
        Ok(DecodedText::plain(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_html() {
        assert_eq!(detect_format(Path::new("test.html")), Some(ContentFormat::Html));
        assert_eq!(detect_format(Path::new("test.HTM")), Some(ContentFormat::Html));
    }

    #[test]
    fn detect_pdf_and_epub() {
        assert_eq!(detect_format(Path::new("book.pdf")), Some(ContentFormat::Pdf));
        assert_eq!(detect_format(Path::new("novel.epub")), Some(ContentFormat::Epub));
    }

    #[test]
    fn detect_text() {
        assert_eq!(detect_format(Path::new("notes.txt")), Some(ContentFormat::PlainText));
        assert_eq!(detect_format(Path::new("readme.md")), Some(ContentFormat::PlainText));
    }

    #[test]
    fn detect_unknown() {
        assert_eq!(detect_format(Path::new("image.png")), None);
        assert_eq!(detect_format(Path::new("no-extension")), None);
    }

    #[test]
    fn plain_text_strips_bom_and_crlf() {
        let decoded = PlainTextDecoder
            .decode(b"\xEF\xBB\xBFline one\r\nline two")
            .unwrap();
        assert_eq!(decoded.text, "line one\nline two");
        assert_eq!(decoded.page_count, None);
    }

    #[test]
    fn plain_text_is_lossy() {
        let decoded = PlainTextDecoder.decode(b"ok \xFF ok").unwrap();
        assert!(decoded.text.starts_with("ok "));
    }
}
