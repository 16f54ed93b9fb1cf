//! Document load pipeline.
//!
//! Orchestrates: existence check → format detection → decode → segment →
//! fallback. I/O and decode failures stop here and become a document status;
//! only an unsupported format is reported before any document exists.

use std::path::Path;

use crate::library::error::{LibraryError, LibraryResult};
use crate::library::fallback::segment_document;
use crate::library::model::{Chapter, ContentFormat, Document, SourceKind};
use crate::library::parser::{self, DecodedText};
use crate::library::segment::ChapterSegmenter;

/// Characters of pasted text kept in a generated document name.
const PASTE_NAME_CHARS: usize = 20;

/// Access to source files. The filesystem in production, fixtures in tests.
pub trait SourceLoader {
    /// Whether the path still resolves to a readable file.
    fn exists(&self, path: &Path) -> bool;

    /// Read and decode the file at `path`.
    fn read(&self, path: &Path) -> LibraryResult<DecodedText>;
}

/// Loads sources from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> LibraryResult<DecodedText> {
        let format = check_supported(path)?;
        let data = std::fs::read(path)?;
        let decoded = parser::decoder_for(format).decode(&data)?;
        tracing::debug!(
            path = %path.display(),
            format = %format,
            pages = ?decoded.page_count,
            "decoded source"
        );
        Ok(decoded)
    }
}

/// Reject paths whose extension no decoder handles.
pub fn check_supported(path: &Path) -> LibraryResult<ContentFormat> {
    parser::detect_format(path).ok_or_else(|| LibraryError::UnsupportedFormat {
        path: path.display().to_string(),
    })
}

/// Result of (re)loading a file-backed source.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<Chapter>),
    Missing,
    Failed(LibraryError),
}

/// Load and segment a file-backed source.
pub fn load_file(
    loader: &dyn SourceLoader,
    segmenter: &ChapterSegmenter,
    path: &Path,
) -> LoadOutcome {
    if !loader.exists(path) {
        tracing::warn!(path = %path.display(), "source missing");
        return LoadOutcome::Missing;
    }
    match loader.read(path) {
        Ok(decoded) => LoadOutcome::Loaded(segment_document(
            segmenter,
            SourceKind::File,
            &decoded.text,
        )),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "source failed to load");
            LoadOutcome::Failed(e)
        }
    }
}

/// Segment pasted text.
pub fn segment_pasted(segmenter: &ChapterSegmenter, text: &str) -> Vec<Chapter> {
    segment_document(segmenter, SourceKind::PastedText, text)
}

/// Apply a load outcome to a document, returning the error for failed loads.
pub fn apply_outcome(document: &mut Document, outcome: LoadOutcome) -> Option<LibraryError> {
    match outcome {
        LoadOutcome::Loaded(chapters) => {
            document.set_chapters(chapters);
            None
        }
        LoadOutcome::Missing => {
            document.mark_missing();
            None
        }
        LoadOutcome::Failed(e) => {
            document.mark_error();
            Some(e)
        }
    }
}

/// Display name for a file-backed document: the file stem.
pub fn name_for_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Display name for pasted text: its first non-blank line, shortened.
pub fn name_for_paste(text: &str) -> String {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        None => "Pasted text".to_string(),
        Some(line) if line.chars().count() <= PASTE_NAME_CHARS => line.to_string(),
        Some(line) => {
            let mut name: String = line.chars().take(PASTE_NAME_CHARS).collect();
            name.push_str("...");
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::library::model::DocumentStatus;

    #[test]
    fn unsupported_format_rejected() {
        let err = check_supported(Path::new("/tmp/picture.png")).unwrap_err();
        assert!(matches!(err, LibraryError::UnsupportedFormat { .. }));
    }

    #[test]
    fn load_text_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("novel.txt");
        std::fs::write(
            &path,
            "第一章 开端\n这是正文内容。\n第二章 继续\n更多正文。",
        )
        .unwrap();

        let outcome = load_file(&FsLoader, &ChapterSegmenter::default(), &path);
        let LoadOutcome::Loaded(chapters) = outcome else {
            panic!("expected loaded outcome");
        };
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].title, "继续");
    }

    #[test]
    fn load_missing_file() {
        let outcome = load_file(
            &FsLoader,
            &ChapterSegmenter::default(),
            Path::new("/definitely/not/here.txt"),
        );
        assert!(matches!(outcome, LoadOutcome::Missing));
    }

    #[test]
    fn corrupt_file_fails_and_marks_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let outcome = load_file(&FsLoader, &ChapterSegmenter::default(), &path);
        let mut doc = Document::from_file("b".into(), "b".into(), path.clone(), 0);
        let err = apply_outcome(&mut doc, outcome);
        assert!(matches!(err, Some(LibraryError::ParseError { .. })));
        assert_eq!(doc.status(), DocumentStatus::Error);
        assert!(doc.chapters().is_empty());
    }

    #[test]
    fn names() {
        assert_eq!(name_for_path(&PathBuf::from("/books/Dune.epub")), "Dune");
        assert_eq!(name_for_paste("\n\n  short line \nmore"), "short line");
        assert_eq!(
            name_for_paste("a very long first line of pasted text"),
            "a very long first li..."
        );
        assert_eq!(name_for_paste("   "), "Pasted text");
    }
}
