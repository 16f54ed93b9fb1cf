//! Persistence and recovery tests for sidelines.
//!
//! These tests verify that the library, per-document reading positions and
//! the active selection survive a restart through the JSON state file, and
//! that restore revalidates stored state against freshly parsed sources.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::json;

use sidelines::config::ReaderConfig;
use sidelines::library::{ChapterSegmenter, DocumentStatus, FsLoader};
use sidelines::persist::record::{DOCUMENTS_KEY, SESSION_KEY};
use sidelines::persist::{JsonFileStore, KeyValueStore, PersistenceCoordinator};
use sidelines::reader::surface::{ScrollReport, SurfaceError, SurfaceResult, WideSeed};
use sidelines::reader::{
    Host, HostPrompts, NarrowSurface, Notice, Reader, ReplaceDecision, StatusLine, WideSurface,
};

struct Quiet;

impl NarrowSurface for Quiet {
    fn show(&mut self, _line: &StatusLine) {}
    fn clear(&mut self) {}
}

impl WideSurface for Quiet {
    fn open(&mut self, _seed: &WideSeed) -> SurfaceResult<()> {
        Ok(())
    }

    fn is_alive(&self) -> bool {
        false
    }

    fn probe_position(&mut self) -> SurfaceResult<ScrollReport> {
        Err(SurfaceError::Disposed)
    }

    fn dispose(&mut self) {}
}

impl HostPrompts for Quiet {
    fn pick_file(&mut self) -> Option<PathBuf> {
        None
    }

    fn confirm_replace(&mut self, _document_name: &str) -> ReplaceDecision {
        ReplaceDecision::Cancel
    }

    fn notify(&mut self, _notice: Notice) {}
}

fn file_reader(state: &Path) -> Reader<JsonFileStore> {
    let host = Host {
        narrow: Box::new(Quiet),
        wide: Box::new(Quiet),
        prompts: Box::new(Quiet),
        loader: Box::new(FsLoader),
    };
    let store = JsonFileStore::open(state).unwrap();
    Reader::new(ReaderConfig::default(), store, host)
}

fn book(chapters: usize) -> String {
    (1..=chapters)
        .map(|i| format!("Chapter {i}\n{}\n", "word ".repeat(40)))
        .collect()
}

#[test]
fn reading_state_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = dir.path().join("state").join("state.json");
    let novel = dir.path().join("novel.txt");
    std::fs::write(&novel, book(3)).unwrap();

    let (chapters, cursor, active) = {
        let mut reader = file_reader(&state);
        let now = Instant::now();
        reader.restore(now);
        reader.open_file(&novel, now).unwrap();
        reader.select_chapter(2, now);
        reader.page_right(now);
        reader.load_pasted_text("a short pasted note", now);
        reader.select_document("novel", now).unwrap();
        assert!(reader.shutdown(now));
        (
            reader.active_document().unwrap().chapters().to_vec(),
            reader.cursor(),
            reader.active_id().map(str::to_string),
        )
    };

    let mut reader = file_reader(&state);
    reader.restore(Instant::now());
    assert_eq!(reader.library().len(), 2);
    assert_eq!(reader.active_id().map(str::to_string), active);
    assert_eq!(reader.active_document().unwrap().chapters(), chapters.as_slice());
    assert_eq!(reader.cursor(), cursor);
    assert_eq!(cursor.chapter_index(), 2);
    assert_eq!(cursor.offset(), 50);

    let pasted = reader.library().get("a-short-pasted-note").unwrap();
    assert_eq!(pasted.chapters()[0].title, "a short pa...");
}

#[test]
fn stored_record_shape() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    let novel = dir.path().join("novel.txt");
    std::fs::write(&novel, book(2)).unwrap();

    let mut reader = file_reader(&state);
    let now = Instant::now();
    reader.open_file(&novel, now).unwrap();
    reader.next_chapter(now);
    reader.load_pasted_text("pasted body", now);
    assert!(reader.tick(now + Duration::from_millis(500)));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state).unwrap()).unwrap();
    let docs = raw[DOCUMENTS_KEY].as_array().unwrap();
    assert_eq!(docs.len(), 2);

    assert_eq!(docs[0]["type"], json!("file"));
    assert_eq!(docs[0]["path"], json!(novel.display().to_string()));
    assert!(docs[0].get("fullText").is_none());
    assert_eq!(docs[0]["lastChapter"], json!(1));
    assert_eq!(docs[0]["chapterOffsets"], json!({"0": 0}));
    assert_eq!(docs[0]["status"], json!("active"));
    assert!(docs[0]["addedTime"].as_u64().unwrap() > 0);

    assert_eq!(docs[1]["type"], json!("pastedText"));
    assert_eq!(docs[1]["fullText"], json!("pasted body"));
    assert_eq!(raw[SESSION_KEY], json!({"currentFileId": "pasted-body"}));
}

#[test]
fn out_of_range_chapter_is_reset_on_restore() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    let novel = dir.path().join("novel.txt");
    std::fs::write(&novel, book(3)).unwrap();

    let mut store = JsonFileStore::open(&state).unwrap();
    store
        .set(
            DOCUMENTS_KEY,
            json!([{
                "id": "novel", "name": "novel", "type": "file",
                "path": novel.display().to_string(),
                "lastChapter": 5, "lastScrollOffset": 77,
                "chapterOffsets": {"1": 12, "5": 77}
            }]),
        )
        .unwrap();
    store
        .set(SESSION_KEY, json!({"currentFileId": "novel"}))
        .unwrap();

    let mut reader = file_reader(&state);
    reader.restore(Instant::now());
    let doc = reader.active_document().unwrap();
    assert_eq!(doc.chapters().len(), 3);
    assert_eq!(doc.last_chapter_index, Some(0));
    assert_eq!(doc.last_offset, 0);
    assert_eq!(doc.chapter_offsets.get(&1), Some(&12));
    assert!(!doc.chapter_offsets.contains_key(&5));
    assert_eq!(reader.cursor().chapter_index(), 0);
    assert_eq!(reader.cursor().offset(), 0);
}

#[test]
fn restore_is_idempotent_and_never_writes() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    let novel = dir.path().join("novel.txt");
    let broken = dir.path().join("broken.epub");
    std::fs::write(&novel, book(2)).unwrap();
    std::fs::write(&broken, "not an archive").unwrap();

    let mut store = JsonFileStore::open(&state).unwrap();
    store
        .set(
            DOCUMENTS_KEY,
            json!([
                {"id": "novel", "name": "novel", "type": "file",
                 "path": novel.display().to_string(), "lastChapter": 1, "lastScrollOffset": 30},
                {"id": "gone", "name": "gone", "type": "file",
                 "path": dir.path().join("gone.txt").display().to_string(),
                 "lastChapter": 4, "lastScrollOffset": 9},
                {"id": "broken", "name": "broken", "type": "file",
                 "path": broken.display().to_string()},
                {"id": "note", "name": "note", "type": "pastedText",
                 "fullText": "CHAPTER ONE\nshort text"}
            ]),
        )
        .unwrap();
    store
        .set(SESSION_KEY, json!({"currentFileId": "gone"}))
        .unwrap();
    let before = std::fs::read_to_string(&state).unwrap();

    let segmenter = ChapterSegmenter::default();
    let mut coordinator =
        PersistenceCoordinator::new(JsonFileStore::open(&state).unwrap(), Duration::ZERO);
    let first = coordinator.restore(&FsLoader, &segmenter);
    let second = coordinator.restore(&FsLoader, &segmenter);
    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(&state).unwrap(), before);

    let lib = &first.library;
    assert_eq!(lib.len(), 4);
    assert_eq!(lib.get("novel").unwrap().status(), DocumentStatus::Active);
    assert_eq!(lib.get("novel").unwrap().last_offset, 30);
    let gone = lib.get("gone").unwrap();
    assert_eq!(gone.status(), DocumentStatus::Missing);
    assert_eq!(gone.last_chapter_index, Some(4));
    assert_eq!(lib.get("broken").unwrap().status(), DocumentStatus::Error);
    assert_eq!(lib.get("note").unwrap().chapters()[0].title, "CHAPTER ONE");
    assert_eq!(first.active, None);
}

#[test]
fn unreadable_state_file_starts_a_fresh_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    std::fs::write(&state, "{ not json").unwrap();
    assert!(JsonFileStore::open(&state).is_err());

    let mut reader = Reader::new(
        ReaderConfig::default(),
        JsonFileStore::open_or_empty(&state),
        Host {
            narrow: Box::new(Quiet),
            wide: Box::new(Quiet),
            prompts: Box::new(Quiet),
            loader: Box::new(FsLoader),
        },
    );
    let now = Instant::now();
    reader.restore(now);
    assert!(reader.library().is_empty());
    assert_eq!(reader.active_id(), None);

    reader.load_pasted_text("hello world", now);
    assert!(reader.shutdown(now));

    let mut reopened = file_reader(&state);
    reopened.restore(now);
    assert_eq!(reopened.library().len(), 1);
    assert_eq!(reopened.active_id(), Some("hello-world"));
}
