//! EPUB decoder using the `epub` crate.
//!
//! Spine items become `{id, title, raw_markup}` records, which are run through
//! the markup normalizer and joined into one text stream.

use std::io::Cursor;

use scraper::{Html, Selector};

use crate::library::error::{LibraryError, LibraryResult};
use crate::library::parser::html::normalize_markup;
use crate::library::parser::{ContentDecoder, DecodedText};

/// One spine item of a packaged e-book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubRecord {
    pub id: String,
    pub title: String,
    pub raw_markup: String,
}

/// EPUB decoder backed by the `epub` crate + the `scraper` normalizer.
pub struct EpubDecoder;

impl ContentDecoder for EpubDecoder {
    fn decode(&self, data: &[u8]) -> LibraryResult<DecodedText> {
        let records = read_records(data)?;
        tracing::debug!(records = records.len(), "epub spine read");
        Ok(DecodedText::plain(join_records(&records)))
    }
}

/// Read the spine in order, skipping items with no content.
pub fn read_records(data: &[u8]) -> LibraryResult<Vec<EpubRecord>> {
    let cursor = Cursor::new(data.to_vec());
    let mut doc =
        epub::doc::EpubDoc::from_reader(cursor).map_err(|e| LibraryError::ParseError {
            format: "epub".into(),
            message: e.to_string(),
        })?;

    let mut records = Vec::new();
    for index in 0..doc.get_num_chapters() {
        doc.set_current_chapter(index);

        let Some((raw_markup, _mime)) = doc.get_current_str() else {
            continue;
        };
        if raw_markup.trim().is_empty() {
            continue;
        }

        let id = doc
            .get_current_id()
            .unwrap_or_else(|| format!("item-{index}"));
        let title = first_heading(&raw_markup).unwrap_or_else(|| format!("Chapter {}", index + 1));
        records.push(EpubRecord {
            id,
            title,
            raw_markup,
        });
    }
    Ok(records)
}

/// Normalize each record and join them with blank lines.
pub fn join_records(records: &[EpubRecord]) -> String {
    records
        .iter()
        .map(|r| normalize_markup(&r.raw_markup))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extract the first heading (h1, h2, or h3) from a markup fragment.
fn first_heading(markup: &str) -> Option<String> {
    let html = Html::parse_document(markup);
    let sel = Selector::parse("h1, h2, h3").ok()?;
    html.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_epub_returns_error() {
        let result = EpubDecoder.decode(b"This is not an EPUB");
        assert!(matches!(result, Err(LibraryError::ParseError { .. })));
    }

    #[test]
    fn records_join_in_spine_order() {
        let records = vec![
            EpubRecord {
                id: "c1".into(),
                title: "One".into(),
                raw_markup: "<html><body><h1>Chapter 1</h1><p>Alpha.</p></body></html>".into(),
            },
            EpubRecord {
                id: "blank".into(),
                title: "Blank".into(),
                raw_markup: "<html><body><img src='x.png'/></body></html>".into(),
            },
            EpubRecord {
                id: "c2".into(),
                title: "Two".into(),
                raw_markup: "<html><body><h1>Chapter 2</h1><p>Beta.</p></body></html>".into(),
            },
        ];
        assert_eq!(
            join_records(&records),
            "Chapter 1\n\nAlpha.\n\nChapter 2\n\nBeta."
        );
    }

    #[test]
    fn first_heading_found() {
        assert_eq!(
            first_heading("<body><p>x</p><h2> Title </h2></body>").as_deref(),
            Some("Title")
        );
        assert_eq!(first_heading("<body><p>x</p></body>"), None);
    }
}
