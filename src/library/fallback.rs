//! Fallback segmentation for text without recognizable chapter boundaries.
//!
//! Blank-line paragraphs become chapters, and blank input becomes a single
//! sentinel chapter. Every non-blank line belongs to some paragraph, so a
//! separate per-line split never applies. The result is never empty.

use crate::library::model::{Chapter, SourceKind};
use crate::library::segment::{ChapterSegmenter, Segmentation};

/// Title of the single chapter produced for entirely blank input.
pub const EMPTY_DOCUMENT_TITLE: &str = "(empty)";

/// Characters kept from a line when it becomes a preview title.
pub const PREVIEW_TITLE_CHARS: usize = 10;

/// Shorten a line into a chapter title.
///
/// Keeps the first [`PREVIEW_TITLE_CHARS`] characters and appends `...` when
/// truncated. A cut that would leave trailing whitespace extends to the next
/// visible character so the title never ends in a gap before the ellipsis.
pub fn preview_title(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() <= PREVIEW_TITLE_CHARS {
        return line.to_string();
    }

    let mut title = String::new();
    let mut chars = line.chars();
    for c in chars.by_ref().take(PREVIEW_TITLE_CHARS) {
        title.push(c);
    }
    if title.ends_with(char::is_whitespace) {
        for c in chars {
            title.push(c);
            if !c.is_whitespace() {
                break;
            }
        }
    }
    title.push_str("...");
    title
}

/// Group non-blank lines into blank-line-delimited paragraphs.
fn paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Produce chapters for text the boundary cascade could not split.
pub fn fallback_chapters(text: &str) -> Vec<Chapter> {
    let paras = paragraphs(text);
    if !paras.is_empty() {
        tracing::debug!(paragraphs = paras.len(), "fallback: paragraph chapters");
        return paras
            .into_iter()
            .map(|lines| Chapter {
                title: preview_title(lines[0]),
                content: lines.into_iter().map(str::to_string).collect(),
            })
            .collect();
    }

    tracing::debug!("fallback: blank input, sentinel chapter");
    vec![Chapter::new(EMPTY_DOCUMENT_TITLE)]
}

/// Decide whether a segmentation outcome needs the fallback, per source kind.
///
/// The two source kinds keep separate activation conditions: file content
/// falls back strictly on an empty result, pasted content accepts whatever
/// the cascade produced and only falls back when no boundary fired.
pub fn needs_fallback(kind: SourceKind, outcome: &Segmentation) -> bool {
    match (kind, outcome) {
        (SourceKind::File, Segmentation::Chapters(chapters)) => chapters.is_empty(),
        (SourceKind::File, Segmentation::NoBoundary) => true,
        (SourceKind::PastedText, Segmentation::Chapters(_)) => false,
        (SourceKind::PastedText, Segmentation::NoBoundary) => true,
    }
}

/// Full segmentation pipeline: cascade first, fallback when required.
pub fn segment_document(
    segmenter: &ChapterSegmenter,
    kind: SourceKind,
    text: &str,
) -> Vec<Chapter> {
    let outcome = segmenter.segment(text);
    if needs_fallback(kind, &outcome) {
        return fallback_chapters(text);
    }
    match outcome.into_chapters() {
        Some(chapters) => chapters,
        None => fallback_chapters(text),
    }
}
