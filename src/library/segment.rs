//! Heuristic chapter segmentation.
//!
//! Lines are tested against an ordered cascade of boundary rules; the first
//! rule that matches turns the line into a chapter title. Text before the
//! first boundary is not retained. When no boundary fires at all the result
//! is [`Segmentation::NoBoundary`], which callers answer with the fallback
//! segmenter in [`crate::library::fallback`].

use std::sync::LazyLock;

use regex::Regex;

use crate::library::model::Chapter;

/// Characters stripped from the front of an extracted title.
const TITLE_SEPARATORS: &[char] = &[
    ':', '：', '、', '.', '．', '·', '-', '—', '–', '_', '|', ',', '，',
];

/// One entry in the boundary cascade: a pattern plus an optional guard
/// that must also hold for the line to count as a boundary.
pub struct BoundaryRule {
    pub name: &'static str,
    pattern: Regex,
    guard: Option<fn(&str) -> bool>,
}

impl BoundaryRule {
    fn new(name: &'static str, pattern: &str, guard: Option<fn(&str) -> bool>) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("static boundary pattern"),
            guard,
        }
    }

    /// Try the rule against a trimmed line, returning the extracted title.
    ///
    /// The title is the last participating capture group, or the whole line
    /// when there is none (or it is empty after separator stripping).
    fn extract(&self, line: &str) -> Option<String> {
        let caps = self.pattern.captures(line)?;
        let candidate = (1..caps.len())
            .rev()
            .find_map(|i| caps.get(i))
            .map(|m| clean_title(m.as_str()))
            .filter(|t| !t.is_empty());
        let title = candidate.unwrap_or_else(|| clean_title(line));
        if title.is_empty() {
            return None;
        }
        if let Some(guard) = self.guard {
            if !guard(&title) {
                return None;
            }
        }
        Some(title)
    }
}

/// Rules in priority order. First match wins; there is no scoring.
static RULES: LazyLock<Vec<BoundaryRule>> = LazyLock::new(|| {
    vec![
        BoundaryRule::new(
            "numbered-cjk",
            r"^第[0-9０-９零〇一二三四五六七八九十百千万两]+[章节回卷集部篇](?:\s*(.*))?$",
            None,
        ),
        BoundaryRule::new(
            "numbered-latin",
            r"(?i)^(?:chapter|chap\.|part|book|volume|vol\.|section)\s+(?:[0-9]+|[ivxlcdm]+|[a-z]|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty)\b(?:\s*(.*))?$",
            None,
        ),
        BoundaryRule::new(
            "banner",
            r"^(?:[=*#~]{2,}|[-_]{3,})\s*(.+?)\s*(?:[=*#~]{2,}|[-_]{3,})$",
            Some(has_alphanumeric),
        ),
        BoundaryRule::new(
            "bracket",
            r"^[【\[〔〖《]\s*(.+?)\s*[】\]〕〗》]$",
            None,
        ),
        BoundaryRule::new(
            "all-caps",
            r"^[A-Z][A-Z0-9 ,.'’:;!?&\-]{2,49}$",
            Some(has_two_letters),
        ),
        BoundaryRule::new(
            "front-back-matter",
            r"(?i)^(?:prologue|epilogue|preface|foreword|introduction|afterword|appendix|acknowledgements|acknowledgments|序言|序章|前言|引子|楔子|尾声|后记|番外)(?:\s*[:：\-—]\s*(.*))?$",
            None,
        ),
    ]
});

fn has_alphanumeric(title: &str) -> bool {
    title.chars().any(char::is_alphanumeric)
}

fn has_two_letters(title: &str) -> bool {
    title.chars().filter(|c| c.is_ascii_alphabetic()).count() >= 2
}

/// Strip leading separators and surrounding whitespace from a title.
fn clean_title(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c))
        .trim_end()
        .to_string()
}

/// A line recognized as a chapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMatch {
    pub rule: &'static str,
    pub title: String,
}

/// Outcome of a segmentation pass.
///
/// "No boundary fired" is a distinct outcome rather than an empty chapter
/// list, so one real chapter is never confused with "fallback needed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segmentation {
    NoBoundary,
    Chapters(Vec<Chapter>),
}

impl Segmentation {
    pub fn into_chapters(self) -> Option<Vec<Chapter>> {
        match self {
            Self::NoBoundary => None,
            Self::Chapters(chapters) => Some(chapters),
        }
    }
}

/// Splits raw text into titled chapters using the boundary cascade.
#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    /// Content lines shorter than this (in chars) are dropped.
    pub min_content_chars: usize,
    /// Lines longer than this (in chars) are never boundary candidates.
    pub max_title_chars: usize,
}

impl Default for ChapterSegmenter {
    fn default() -> Self {
        Self {
            min_content_chars: 2,
            max_title_chars: 80,
        }
    }
}

impl ChapterSegmenter {
    pub fn new(min_content_chars: usize, max_title_chars: usize) -> Self {
        Self {
            min_content_chars,
            max_title_chars,
        }
    }

    /// Test a single line against the cascade.
    pub fn match_boundary(&self, line: &str) -> Option<BoundaryMatch> {
        let line = line.trim();
        if line.is_empty() || line.chars().count() > self.max_title_chars {
            return None;
        }
        RULES.iter().find_map(|rule| {
            rule.extract(line).map(|title| BoundaryMatch {
                rule: rule.name,
                title,
            })
        })
    }

    /// Segment raw text into chapters.
    pub fn segment(&self, text: &str) -> Segmentation {
        let mut chapters = Vec::new();
        let mut open: Option<Chapter> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(boundary) = self.match_boundary(line) {
                tracing::trace!(rule = boundary.rule, title = %boundary.title, "chapter boundary");
                if let Some(done) = open.take() {
                    chapters.push(done);
                }
                open = Some(Chapter::new(boundary.title));
                continue;
            }

            if line.chars().count() < self.min_content_chars {
                continue;
            }
            if let Some(chapter) = open.as_mut() {
                chapter.content.push(line.to_string());
            }
        }

        if let Some(done) = open.take() {
            chapters.push(done);
        }

        if chapters.is_empty() {
            Segmentation::NoBoundary
        } else {
            tracing::debug!(chapters = chapters.len(), "segmented text");
            Segmentation::Chapters(chapters)
        }
    }
}
