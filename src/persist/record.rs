//! Persisted record shapes.
//!
//! Chapters are never stored: file-backed documents are re-parsed from their
//! path on restore, and pasted documents keep their full text verbatim.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::library::model::{Document, DocumentStatus, SourceKind};

/// Store key for the document list.
pub const DOCUMENTS_KEY: &str = "sidelines.documents";
/// Store key for the session singleton.
pub const SESSION_KEY: &str = "sidelines.session";

/// One document as written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default)]
    pub added_time: u64,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub last_chapter: Option<usize>,
    #[serde(default)]
    pub last_scroll_offset: usize,
    #[serde(default)]
    pub last_read_time: Option<u64>,
    #[serde(default)]
    pub chapter_offsets: BTreeMap<usize, usize>,
}

impl DocumentRecord {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            kind: doc.source_kind,
            path: doc.path.clone(),
            full_text: match doc.source_kind {
                SourceKind::PastedText => doc.pasted_text.clone(),
                SourceKind::File => None,
            },
            added_time: doc.added_time,
            status: doc.status(),
            last_chapter: doc.last_chapter_index,
            last_scroll_offset: doc.last_offset,
            last_read_time: doc.last_access_time,
            chapter_offsets: doc.chapter_offsets.clone(),
        }
    }

    /// A document carrying this record's identity and reading state but no
    /// chapters yet. File records without a path are unusable and come
    /// back as `None`.
    pub fn to_document(&self) -> Option<Document> {
        let mut doc = match self.kind {
            SourceKind::File => Document::from_file(
                self.id.clone(),
                self.name.clone(),
                self.path.clone()?,
                self.added_time,
            ),
            SourceKind::PastedText => Document::from_pasted(
                self.id.clone(),
                self.name.clone(),
                self.full_text.clone().unwrap_or_default(),
                self.added_time,
            ),
        };
        doc.last_chapter_index = self.last_chapter;
        doc.last_offset = self.last_scroll_offset;
        doc.last_access_time = self.last_read_time;
        doc.chapter_offsets = self.chapter_offsets.clone();
        Some(doc)
    }
}

/// The session singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub current_file_id: Option<String>,
}
