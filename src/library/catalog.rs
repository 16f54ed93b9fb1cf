//! The in-memory document library.
//!
//! Documents are kept in insertion order. File-backed documents are unique
//! by source path; every document is unique by id. Durable storage is the
//! job of [`crate::persist`], which snapshots the library on change.

use std::path::Path;

use crate::library::error::{LibraryError, LibraryResult};
use crate::library::model::{Chapter, Document, DocumentStatus};

/// Ordered collection of loaded documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    documents: Vec<Document>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Returns error if its id or source path is taken.
    pub fn add(&mut self, document: Document) -> LibraryResult<()> {
        if self.get(&document.id).is_some() {
            return Err(LibraryError::Duplicate { id: document.id });
        }
        if let Some(existing) = document.path.as_deref().and_then(|p| self.find_by_path(p)) {
            return Err(LibraryError::Duplicate {
                id: existing.id.clone(),
            });
        }
        tracing::info!(id = %document.id, kind = %document.source_kind, "document added");
        self.documents.push(document);
        Ok(())
    }

    /// Swap in a freshly computed chapter list, keeping identity and
    /// position fields. Returns `true` if the stored position had to be reset.
    pub fn replace_chapters(&mut self, id: &str, chapters: Vec<Chapter>) -> LibraryResult<bool> {
        let doc = self.get_mut(id).ok_or_else(|| LibraryError::DocumentNotFound {
            id: id.to_string(),
        })?;
        doc.set_chapters(chapters);
        Ok(doc.validate_position())
    }

    /// Remove a document by ID. Returns the removed document, or error if not found.
    pub fn remove(&mut self, id: &str) -> LibraryResult<Document> {
        let pos = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| LibraryError::DocumentNotFound { id: id.into() })?;
        let doc = self.documents.remove(pos);
        tracing::info!(id = %doc.id, "document removed");
        Ok(doc)
    }

    /// Drop every document whose source is missing. Returns the removed ids.
    pub fn remove_missing(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.documents.retain(|d| {
            if d.status() == DocumentStatus::Missing {
                removed.push(d.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Look up a document by ID.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Find the file-backed document loaded from `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.path.as_deref() == Some(path))
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Derive an unused id from a display name.
    pub fn allocate_id(&self, name: &str) -> String {
        let base = match slugify(name) {
            s if s.is_empty() => "document".to_string(),
            s => s,
        };
        if self.get(&base).is_none() {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or(base)
    }
}

/// Generate a slug from a title string. Non-ASCII letters are kept.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn file_doc(id: &str, path: &str) -> Document {
        Document::from_file(id.into(), id.into(), PathBuf::from(path), 0)
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("special!@#chars"), "special-chars");
        assert_eq!(slugify("三体 第一部"), "三体-第一部");
    }

    #[test]
    fn add_and_list_in_order() {
        let mut library = Library::new();
        assert!(library.is_empty());
        library.add(file_doc("b", "/b.txt")).unwrap();
        library.add(file_doc("a", "/a.txt")).unwrap();
        let ids: Vec<_> = library.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn duplicate_path_rejected() {
        let mut library = Library::new();
        library.add(file_doc("one", "/same.txt")).unwrap();
        let err = library.add(file_doc("two", "/same.txt")).unwrap_err();
        assert!(matches!(err, LibraryError::Duplicate { id } if id == "one"));
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut library = Library::new();
        library.add(file_doc("one", "/a.txt")).unwrap();
        assert!(library.add(file_doc("one", "/b.txt")).is_err());
    }

    #[test]
    fn allocate_id_uniquifies() {
        let mut library = Library::new();
        assert_eq!(library.allocate_id("My Book"), "my-book");
        library.add(file_doc("my-book", "/1.txt")).unwrap();
        assert_eq!(library.allocate_id("My Book"), "my-book-2");
        library.add(file_doc("my-book-2", "/2.txt")).unwrap();
        assert_eq!(library.allocate_id("my book!"), "my-book-3");
        assert_eq!(library.allocate_id("!!!"), "document");
    }

    #[test]
    fn remove_and_not_found() {
        let mut library = Library::new();
        library.add(file_doc("x", "/x.txt")).unwrap();
        assert_eq!(library.remove("x").unwrap().id, "x");
        assert!(matches!(
            library.remove("x"),
            Err(LibraryError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn remove_missing_only_drops_missing() {
        let mut library = Library::new();
        let mut gone = file_doc("gone", "/gone.txt");
        gone.mark_missing();
        let mut broken = file_doc("broken", "/broken.pdf");
        broken.mark_error();
        library.add(gone).unwrap();
        library.add(broken).unwrap();
        library.add(file_doc("ok", "/ok.txt")).unwrap();

        assert_eq!(library.remove_missing(), vec!["gone".to_string()]);
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn replace_chapters_keeps_identity_and_validates() {
        let mut library = Library::new();
        let mut doc = file_doc("x", "/x.txt");
        doc.set_chapters(vec![Chapter::new("a"), Chapter::new("b"), Chapter::new("c")]);
        doc.last_chapter_index = Some(2);
        doc.added_time = 77;
        library.add(doc).unwrap();

        let reset = library
            .replace_chapters("x", vec![Chapter::new("only")])
            .unwrap();
        assert!(reset);
        let doc = library.get("x").unwrap();
        assert_eq!(doc.added_time, 77);
        assert_eq!(doc.last_chapter_index, Some(0));
        assert_eq!(doc.chapters().len(), 1);
    }
}
