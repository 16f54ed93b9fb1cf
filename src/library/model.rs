//! Core data types for the reading library.
//!
//! A [`Document`] is one loaded source (a file or pasted text) decomposed into
//! ordered [`Chapter`]s, plus the reading state that survives restarts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Separator used when flattening chapter lines into one addressable text.
pub const LINE_SEPARATOR: char = '\n';

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentFormat {
    Html,
    Pdf,
    Epub,
    PlainText,
}

impl ContentFormat {
    /// Human-readable name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::PlainText => "text",
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a document's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// A file on the local filesystem, re-read on every restore.
    File,
    /// Text pasted by the user, stored verbatim.
    PastedText,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::PastedText => f.write_str("pasted"),
        }
    }
}

/// Load status of a document. Only `Active` documents carry chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentStatus {
    #[default]
    Active,
    /// The source path no longer resolves.
    Missing,
    /// The source exists but could not be decoded.
    Error,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Missing => f.write_str("missing"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A titled, ordered span of content lines.
///
/// Content lines are trimmed and non-empty. The flattened form used for
/// offset addressing is derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: Vec<String>,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
        }
    }

    /// Content lines joined with [`LINE_SEPARATOR`].
    pub fn flattened(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.content.iter().enumerate() {
            if i > 0 {
                out.push(LINE_SEPARATOR);
            }
            out.push_str(line);
        }
        out
    }

    /// Character length of the flattened text.
    pub fn flattened_len(&self) -> usize {
        let chars: usize = self.content.iter().map(|l| l.chars().count()).sum();
        chars + self.content.len().saturating_sub(1)
    }

    /// Largest valid cursor offset: `max(0, len - 1)`.
    pub fn max_offset(&self) -> usize {
        self.flattened_len().saturating_sub(1)
    }
}

/// One loaded source with its chapters and reading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Slug identifier, unique within the library.
    pub id: String,
    /// Display name.
    pub name: String,
    pub source_kind: SourceKind,
    /// Source path for file-backed documents.
    pub path: Option<PathBuf>,
    /// Original text for pasted documents (kept verbatim for restore).
    pub pasted_text: Option<String>,
    chapters: Vec<Chapter>,
    status: DocumentStatus,
    pub last_chapter_index: Option<usize>,
    pub last_offset: usize,
    pub chapter_offsets: BTreeMap<usize, usize>,
    /// Seconds since UNIX epoch.
    pub added_time: u64,
    /// Seconds since UNIX epoch of the last navigation.
    pub last_access_time: Option<u64>,
}

impl Document {
    /// A fresh file-backed document.
    pub fn from_file(id: String, name: String, path: PathBuf, added_time: u64) -> Self {
        Self::empty(id, name, SourceKind::File, Some(path), None, added_time)
    }

    /// A fresh pasted-text document.
    pub fn from_pasted(id: String, name: String, text: String, added_time: u64) -> Self {
        Self::empty(id, name, SourceKind::PastedText, None, Some(text), added_time)
    }

    fn empty(
        id: String,
        name: String,
        source_kind: SourceKind,
        path: Option<PathBuf>,
        pasted_text: Option<String>,
        added_time: u64,
    ) -> Self {
        Self {
            id,
            name,
            source_kind,
            path,
            pasted_text,
            chapters: Vec::new(),
            status: DocumentStatus::Active,
            last_chapter_index: None,
            last_offset: 0,
            chapter_offsets: BTreeMap::new(),
            added_time,
            last_access_time: None,
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == DocumentStatus::Active
    }

    /// Replace the chapter list wholesale and mark the document active.
    pub fn set_chapters(&mut self, chapters: Vec<Chapter>) {
        self.chapters = chapters;
        self.status = DocumentStatus::Active;
    }

    /// Mark the source as missing. Chapters are dropped; position fields
    /// stay untouched so they come back if the file reappears.
    pub fn mark_missing(&mut self) {
        self.chapters.clear();
        self.status = DocumentStatus::Missing;
    }

    /// Mark the source as undecodable. Chapters are dropped.
    pub fn mark_error(&mut self) {
        self.chapters.clear();
        self.status = DocumentStatus::Error;
    }

    /// Check the stored chapter index against the current chapter list,
    /// resetting the position to the start when it no longer fits.
    ///
    /// Returns `true` if a reset happened.
    pub fn validate_position(&mut self) -> bool {
        match self.last_chapter_index {
            Some(index) if index >= self.chapters.len() => {
                self.last_chapter_index = Some(0).filter(|_| !self.chapters.is_empty());
                self.last_offset = 0;
                self.chapter_offsets.retain(|&k, _| k < self.chapters.len());
                true
            }
            _ => false,
        }
    }

    /// Reading progress through the document as a fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = self.chapters.len();
        if total == 0 {
            return 0.0;
        }
        let index = self.last_chapter_index.unwrap_or(0).min(total - 1);
        let within = self
            .chapters
            .get(index)
            .map(|c| {
                let len = c.flattened_len();
                if len == 0 {
                    0.0
                } else {
                    self.last_offset.min(len) as f64 / len as f64
                }
            })
            .unwrap_or(0.0);
        ((index as f64 + within) / total as f64).clamp(0.0, 1.0)
    }
}

/// Seconds since UNIX epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
