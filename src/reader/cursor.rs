//! Scroll cursor: the single authoritative reading position.
//!
//! The cursor is `(chapter_index, offset)` where `offset` is a character index
//! into the current chapter's flattened text. Every mutation clamps against
//! the current chapter's length, re-derived from its content each time, and
//! writes the result through to the document's reading-state fields.

use crate::library::model::{Chapter, Document};

/// Reading position within the active document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollCursor {
    chapter_index: usize,
    offset: usize,
}

/// The slice of chapter text shown on the narrow surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub total: usize,
    /// `"{start}-{end}/{total}"`, absent when the whole chapter fits.
    pub marker: Option<String>,
}

impl ScrollCursor {
    /// Position at the document's stored reading state, clamped.
    pub fn resume(document: &Document) -> Self {
        let count = document.chapters().len();
        let chapter_index = document
            .last_chapter_index
            .filter(|&i| i < count)
            .unwrap_or(0);
        let mut cursor = Self {
            chapter_index,
            offset: document.last_offset,
        };
        cursor.clamp(document.chapter(chapter_index));
        cursor
    }

    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Clamp the offset into `[0, max_offset]` for `chapter`.
    /// With no chapter the offset is pinned to zero.
    pub fn clamp(&mut self, chapter: Option<&Chapter>) {
        let max = chapter.map(Chapter::max_offset).unwrap_or(0);
        self.offset = self.offset.min(max);
    }

    /// Switch chapters. Out-of-range indices are ignored.
    ///
    /// The outgoing chapter's offset is remembered in the document's
    /// per-chapter map and the incoming chapter resumes from that map.
    /// Returns `true` when the chapter changed.
    pub fn set_chapter(&mut self, document: &mut Document, index: usize) -> bool {
        if index >= document.chapters().len() || index == self.chapter_index {
            return false;
        }
        document
            .chapter_offsets
            .insert(self.chapter_index, self.offset);
        self.chapter_index = index;
        self.offset = document.chapter_offsets.get(&index).copied().unwrap_or(0);
        self.write_back(document);
        tracing::debug!(chapter = index, offset = self.offset, "chapter switched");
        true
    }

    /// Move by `delta` characters, clamped to the current chapter.
    pub fn step_by(&mut self, document: &mut Document, delta: isize) {
        if document.chapter(self.chapter_index).is_none() {
            self.offset = 0;
            return;
        }
        self.offset = if delta < 0 {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta.unsigned_abs())
        };
        self.write_back(document);
    }

    /// Jump to an absolute offset, clamped to the current chapter.
    pub fn set_offset(&mut self, document: &mut Document, offset: usize) {
        self.offset = offset;
        self.write_back(document);
    }

    /// Clamp, then record the position on the document.
    fn write_back(&mut self, document: &mut Document) {
        self.clamp(document.chapter(self.chapter_index));
        if !document.chapters().is_empty() {
            document.last_chapter_index = Some(self.chapter_index);
            document.last_offset = self.offset;
        }
    }

    /// The `width`-character window starting at the cursor.
    pub fn visible_window(&self, chapter: Option<&Chapter>, width: usize) -> VisibleWindow {
        let Some(chapter) = chapter else {
            return VisibleWindow {
                text: String::new(),
                start: 0,
                end: 0,
                total: 0,
                marker: None,
            };
        };
        let flat = chapter.flattened();
        let total = chapter.flattened_len();
        let start = self.offset.min(chapter.max_offset());
        let end = start.saturating_add(width).min(total);
        let text: String = flat.chars().skip(start).take(end - start).collect();
        let marker = (total > width).then(|| format!("{start}-{end}/{total}"));
        VisibleWindow {
            text,
            start,
            end,
            total,
            marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(chapters: Vec<Chapter>) -> Document {
        let mut doc = Document::from_pasted("d".into(), "d".into(), String::new(), 0);
        doc.set_chapters(chapters);
        doc
    }

    fn chapter_of_len(len: usize) -> Chapter {
        Chapter {
            title: "c".into(),
            content: vec!["x".repeat(len)],
        }
    }

    #[test]
    fn step_clamps_at_max_offset() {
        let mut doc = doc_with(vec![chapter_of_len(500)]);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.set_offset(&mut doc, 450);
        cursor.step_by(&mut doc, 80);
        assert_eq!(cursor.offset(), 499);
        assert_eq!(doc.last_offset, 499);
    }

    #[test]
    fn step_clamps_at_zero() {
        let mut doc = doc_with(vec![chapter_of_len(100)]);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.step_by(&mut doc, 10);
        cursor.step_by(&mut doc, -50);
        assert_eq!(cursor.offset(), 0);
    }

    #[test]
    fn no_chapters_is_a_no_op() {
        let mut doc = doc_with(Vec::new());
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.step_by(&mut doc, 25);
        assert!(!cursor.set_chapter(&mut doc, 0));
        cursor.set_offset(&mut doc, 10);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.chapter_index(), 0);
        assert_eq!(doc.last_chapter_index, None);
    }

    #[test]
    fn set_chapter_remembers_offsets() {
        let mut doc = doc_with(vec![chapter_of_len(100), chapter_of_len(100)]);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.set_offset(&mut doc, 40);

        assert!(cursor.set_chapter(&mut doc, 1));
        assert_eq!(cursor.offset(), 0);
        assert_eq!(doc.chapter_offsets.get(&0), Some(&40));
        cursor.set_offset(&mut doc, 7);

        assert!(cursor.set_chapter(&mut doc, 0));
        assert_eq!(cursor.offset(), 40);
        assert_eq!(doc.chapter_offsets.get(&1), Some(&7));
        assert_eq!(doc.last_chapter_index, Some(0));
        assert_eq!(doc.last_offset, 40);
    }

    #[test]
    fn set_chapter_out_of_range_ignored() {
        let mut doc = doc_with(vec![chapter_of_len(10)]);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.set_offset(&mut doc, 5);
        assert!(!cursor.set_chapter(&mut doc, 3));
        assert_eq!(cursor.chapter_index(), 0);
        assert_eq!(cursor.offset(), 5);
    }

    #[test]
    fn remembered_offset_is_clamped_on_return() {
        let mut doc = doc_with(vec![chapter_of_len(10), chapter_of_len(10)]);
        doc.chapter_offsets.insert(1, 9_999);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.set_chapter(&mut doc, 1);
        assert_eq!(cursor.offset(), 9);
    }

    #[test]
    fn resume_clamps_stored_state() {
        let mut doc = doc_with(vec![chapter_of_len(10)]);
        doc.last_chapter_index = Some(4);
        doc.last_offset = 300;
        let cursor = ScrollCursor::resume(&doc);
        assert_eq!(cursor.chapter_index(), 0);
        assert_eq!(cursor.offset(), 9);
    }

    #[test]
    fn visible_window_and_marker() {
        let chapter = Chapter {
            title: "t".into(),
            content: vec!["abcdefghij".into(), "klmnop".into()],
        };
        let mut doc = doc_with(vec![chapter]);
        let mut cursor = ScrollCursor::resume(&doc);
        cursor.set_offset(&mut doc, 8);

        let window = cursor.visible_window(doc.chapter(0), 5);
        assert_eq!(window.text, "ij\nkl");
        assert_eq!(window.marker.as_deref(), Some("8-13/17"));

        let wide = cursor.visible_window(doc.chapter(0), 40);
        assert_eq!(wide.end, 17);
        assert_eq!(wide.marker, None);
    }

    #[test]
    fn random_walk_stays_in_bounds() {
        let mut doc = doc_with(vec![chapter_of_len(37), chapter_of_len(3), Chapter::new("empty")]);
        let mut cursor = ScrollCursor::resume(&doc);
        let deltas = [5isize, -80, 80, 1, -1, 36, 100, -3];
        for (i, delta) in deltas.iter().cycle().take(64).enumerate() {
            if i % 7 == 0 {
                cursor.set_chapter(&mut doc, i % 4);
            }
            cursor.step_by(&mut doc, *delta);
            let max = doc.chapter(cursor.chapter_index()).unwrap().max_offset();
            assert!(cursor.offset() <= max);
        }
    }
}
