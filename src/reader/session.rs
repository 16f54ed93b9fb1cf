//! The reading session: one library, one active document, one cursor.
//!
//! [`Reader`] is the command surface the host drives. Every command runs to
//! completion on the caller's thread. Commands that change reading state
//! redisplay the narrow surface and notify the persistence coordinator; the
//! host calls [`Reader::tick`] from its timer to let debounced writes fire.
//!
//! The wide panel is force-closed, with its position committed, before any
//! command moves the cursor to different content.

use std::path::Path;
use std::time::Instant;

use crate::config::ReaderConfig;
use crate::library::catalog::Library;
use crate::library::error::{LibraryError, LibraryResult};
use crate::library::ingest::{self, LoadOutcome, SourceLoader};
use crate::library::model::{Document, DocumentStatus, unix_now};
use crate::library::segment::ChapterSegmenter;
use crate::persist::coordinator::{CoordinatorState, PersistenceCoordinator};
use crate::persist::store::KeyValueStore;
use crate::reader::cursor::{ScrollCursor, VisibleWindow};
use crate::reader::reconcile::{Commit, Reconciler};
use crate::reader::surface::{
    ChapterEntryView, HostPrompts, LibraryEntryView, NarrowSurface, Notice, PanelMessage,
    ReplaceDecision, StatusLine, WideSurface,
};

/// Host-provided collaborators.
pub struct Host {
    pub narrow: Box<dyn NarrowSurface>,
    pub wide: Box<dyn WideSurface>,
    pub prompts: Box<dyn HostPrompts>,
    pub loader: Box<dyn SourceLoader>,
}

pub struct Reader<S: KeyValueStore> {
    config: ReaderConfig,
    segmenter: ChapterSegmenter,
    library: Library,
    active: Option<String>,
    cursor: ScrollCursor,
    reconciler: Reconciler,
    narrow: Box<dyn NarrowSurface>,
    prompts: Box<dyn HostPrompts>,
    loader: Box<dyn SourceLoader>,
    coordinator: PersistenceCoordinator<S>,
}

impl<S: KeyValueStore> Reader<S> {
    /// An empty session. Call [`Reader::restore`] to load stored state.
    pub fn new(config: ReaderConfig, store: S, host: Host) -> Self {
        Self {
            segmenter: config.segmenter(),
            coordinator: PersistenceCoordinator::new(store, config.debounce()),
            config,
            library: Library::new(),
            active: None,
            cursor: ScrollCursor::default(),
            reconciler: Reconciler::new(host.wide),
            narrow: host.narrow,
            prompts: host.prompts,
            loader: host.loader,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.as_deref().and_then(|id| self.library.get(id))
    }

    pub fn cursor(&self) -> ScrollCursor {
        self.cursor
    }

    pub fn coordinator(&self) -> &PersistenceCoordinator<S> {
        &self.coordinator
    }

    pub fn is_wide_open(&self) -> bool {
        self.reconciler.is_open()
    }

    /// The window the narrow surface currently shows.
    pub fn visible_window(&self) -> VisibleWindow {
        let chapter = self
            .active_document()
            .and_then(|doc| doc.chapter(self.cursor.chapter_index()));
        self.cursor.visible_window(chapter, self.config.window_width)
    }

    // -----------------------------------------------------------------------
    // Startup and shutdown
    // -----------------------------------------------------------------------

    /// Replace the in-memory session with the stored one.
    ///
    /// The stored selection is replayed through the same activation path as
    /// live navigation while the coordinator is `Restoring`, so nothing is
    /// written back until restore has finished.
    pub fn restore(&mut self, now: Instant) {
        self.reconciler.close();
        self.coordinator.begin_restore();
        let restored = self
            .coordinator
            .load_restored(self.loader.as_ref(), &self.segmenter);
        self.library = restored.library;
        self.active = None;
        self.cursor = ScrollCursor::default();
        if let Some(id) = restored.active {
            self.activate(&id, now);
        }
        self.coordinator.finish_restore();
        self.redisplay();
    }

    /// Let a due debounced write fire. Returns `true` if state was written.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.coordinator.tick(now, &self.library, self.active.as_deref())
    }

    /// Commit an open wide panel and write any pending state immediately.
    pub fn shutdown(&mut self, now: Instant) -> bool {
        self.commit_wide(now);
        self.coordinator.flush(&self.library, self.active.as_deref())
    }

    // -----------------------------------------------------------------------
    // Cursor navigation
    // -----------------------------------------------------------------------

    pub fn step_left(&mut self, now: Instant) {
        self.step(-signed(self.config.fine_step), now);
    }

    pub fn step_right(&mut self, now: Instant) {
        self.step(signed(self.config.fine_step), now);
    }

    pub fn page_left(&mut self, now: Instant) {
        self.step(-signed(self.config.page_step), now);
    }

    pub fn page_right(&mut self, now: Instant) {
        self.step(signed(self.config.page_step), now);
    }

    fn step(&mut self, delta: isize, now: Instant) {
        self.commit_wide(now);
        let Some(doc) = self.active.as_deref().and_then(|id| self.library.get_mut(id)) else {
            return;
        };
        self.cursor.step_by(doc, delta);
        doc.last_access_time = Some(unix_now());
        tracing::debug!(
            chapter = self.cursor.chapter_index(),
            offset = self.cursor.offset(),
            delta,
            "cursor stepped"
        );
        self.redisplay();
        self.coordinator.notify_change(now);
    }

    /// Switch to chapter `index` of the active document.
    /// Out-of-range or unchanged indices are ignored.
    pub fn select_chapter(&mut self, index: usize, now: Instant) -> bool {
        let Some(doc) = self.active_document() else {
            return false;
        };
        if doc.chapter(index).is_none() || index == self.cursor.chapter_index() {
            return false;
        }
        self.commit_wide(now);
        let Some(doc) = self.active.as_deref().and_then(|id| self.library.get_mut(id)) else {
            return false;
        };
        let changed = self.cursor.set_chapter(doc, index);
        doc.last_access_time = Some(unix_now());
        self.redisplay();
        self.coordinator.notify_change(now);
        changed
    }

    pub fn next_chapter(&mut self, now: Instant) -> bool {
        let next = self.cursor.chapter_index() + 1;
        self.select_chapter(next, now)
    }

    pub fn previous_chapter(&mut self, now: Instant) -> bool {
        match self.cursor.chapter_index().checked_sub(1) {
            Some(prev) => self.select_chapter(prev, now),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Wide panel
    // -----------------------------------------------------------------------

    /// Open the wide panel on the current chapter, or close and commit it.
    /// Returns whether the panel is open afterwards.
    pub fn toggle_wide(&mut self, now: Instant) -> bool {
        if self.reconciler.is_open() {
            self.commit_wide(now);
            return false;
        }
        let Some(doc) = self.active.as_deref().and_then(|id| self.library.get(id)) else {
            self.prompts.notify(Notice::info("Open a document first."));
            return false;
        };
        let index = self.cursor.chapter_index();
        let Some(chapter) = doc.chapter(index) else {
            self.prompts
                .notify(Notice::info("This document has no readable chapters."));
            return false;
        };
        match self
            .reconciler
            .open(&doc.id, index, chapter, self.cursor.offset())
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open wide panel");
                self.prompts
                    .notify(Notice::error(format!("Could not open the reading panel: {e}")));
                false
            }
        }
    }

    /// Handle a message from the wide panel.
    pub fn on_panel_message(&mut self, message: PanelMessage, now: Instant) {
        match message {
            PanelMessage::Scrolled(report) => self.reconciler.on_scroll(report),
            PanelMessage::SyncRequested => {
                if let Some(commit) = self.reconciler.sync() {
                    self.apply_commit(commit, now);
                }
            }
            PanelMessage::Closed => self.commit_wide(now),
        }
    }

    fn commit_wide(&mut self, now: Instant) {
        if let Some(commit) = self.reconciler.close() {
            self.apply_commit(commit, now);
        }
    }

    fn apply_commit(&mut self, commit: Commit, now: Instant) {
        let Some(doc) = self.library.get_mut(&commit.document_id) else {
            tracing::warn!(
                document = %commit.document_id,
                "dropping panel position for removed document"
            );
            return;
        };
        let current = self.active.as_deref() == Some(commit.document_id.as_str())
            && self.cursor.chapter_index() == commit.chapter_index;
        if current {
            self.cursor.set_offset(doc, commit.offset);
            doc.chapter_offsets
                .insert(commit.chapter_index, self.cursor.offset());
        } else {
            let clamped = doc
                .chapter(commit.chapter_index)
                .map(|c| commit.offset.min(c.max_offset()));
            if let Some(offset) = clamped {
                doc.chapter_offsets.insert(commit.chapter_index, offset);
            }
        }
        tracing::debug!(
            document = %commit.document_id,
            chapter = commit.chapter_index,
            offset = commit.offset,
            "panel position committed"
        );
        self.redisplay();
        self.coordinator.notify_change(now);
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Ask the host for a file and open it. Failures become notices.
    pub fn select_file(&mut self, now: Instant) -> Option<String> {
        let path = self.prompts.pick_file()?;
        match self.open_file(&path, now) {
            Ok(id) => id,
            Err(e) => {
                self.prompts.notify(Notice::error(e.to_string()));
                None
            }
        }
    }

    /// Open `path` as a document and select it.
    ///
    /// Unsupported formats and missing files fail before anything is created.
    /// A decode failure still adds the document, with `Error` status.
    /// Re-opening a path that is already in the library asks the host whether
    /// to replace it in place.
    /// Returns the document id, or `None` if the user cancelled.
    pub fn open_file(&mut self, path: &Path, now: Instant) -> LibraryResult<Option<String>> {
        ingest::check_supported(path)?;

        if let Some(existing) = self.library.find_by_path(path) {
            let (id, name) = (existing.id.clone(), existing.name.clone());
            return match self.prompts.confirm_replace(&name) {
                ReplaceDecision::Cancel => {
                    tracing::debug!(id = %id, "replace cancelled");
                    Ok(None)
                }
                ReplaceDecision::Replace => {
                    self.replace_file(&id, path, now)?;
                    Ok(Some(id))
                }
            };
        }

        let outcome = ingest::load_file(self.loader.as_ref(), &self.segmenter, path);
        if matches!(outcome, LoadOutcome::Missing) {
            return Err(LibraryError::SourceMissing {
                path: path.display().to_string(),
            });
        }
        let name = ingest::name_for_path(path);
        let id = self.library.allocate_id(&name);
        let mut doc = Document::from_file(id.clone(), name, path.to_path_buf(), unix_now());
        let error = ingest::apply_outcome(&mut doc, outcome);
        let notice = load_notice(&doc, error);
        let usable = doc.is_active();
        self.library.add(doc)?;
        if let Some(notice) = notice {
            self.prompts.notify(notice);
        }

        if usable {
            self.activate(&id, now);
        } else {
            self.coordinator.notify_change(now);
        }
        Ok(Some(id))
    }

    /// Reload a document's chapters in place, keeping its id and added time.
    fn replace_file(&mut self, id: &str, path: &Path, now: Instant) -> LibraryResult<()> {
        self.commit_wide(now);
        let outcome = ingest::load_file(self.loader.as_ref(), &self.segmenter, path);
        let (reset, notice) = match outcome {
            LoadOutcome::Loaded(chapters) => (self.library.replace_chapters(id, chapters)?, None),
            other => {
                let doc = self
                    .library
                    .get_mut(id)
                    .ok_or_else(|| LibraryError::DocumentNotFound { id: id.to_string() })?;
                let error = ingest::apply_outcome(doc, other);
                (false, load_notice(doc, error))
            }
        };
        if let Some(notice) = notice {
            self.prompts.notify(notice);
        }

        let usable = self.library.get(id).is_some_and(Document::is_active);
        if usable {
            if reset {
                self.notify_position_reset(id);
            }
            self.activate(id, now);
        } else {
            if self.active.as_deref() == Some(id) {
                self.deselect();
            }
            self.coordinator.notify_change(now);
        }
        tracing::info!(id, usable, reset, "document replaced");
        Ok(())
    }

    /// Select a document from the library.
    ///
    /// A document whose source was missing or broken is reloaded first; if
    /// it is still unusable the selection is left unchanged and a notice is
    /// shown. Returns whether the document is now selected.
    pub fn select_document(&mut self, id: &str, now: Instant) -> LibraryResult<bool> {
        let doc = self
            .library
            .get(id)
            .ok_or_else(|| LibraryError::DocumentNotFound { id: id.to_string() })?;

        if !doc.is_active() {
            let Some(path) = doc.path.clone() else {
                return Ok(false);
            };
            let outcome = ingest::load_file(self.loader.as_ref(), &self.segmenter, &path);
            let doc = self
                .library
                .get_mut(id)
                .ok_or_else(|| LibraryError::DocumentNotFound { id: id.to_string() })?;
            let previous = doc.status();
            let error = ingest::apply_outcome(doc, outcome);
            if !doc.is_active() {
                let notice = load_notice(doc, error);
                if let Some(notice) = notice {
                    self.prompts.notify(notice);
                }
                if doc.status() != previous {
                    self.coordinator.notify_change(now);
                }
                return Ok(false);
            }
            tracing::info!(id, "source available again");
        }

        self.activate(id, now);
        Ok(true)
    }

    /// Make `id` the active document and resume its stored position.
    fn activate(&mut self, id: &str, now: Instant) {
        self.commit_wide(now);
        let Some(doc) = self.library.get_mut(id) else {
            return;
        };
        let reset = doc.validate_position();
        self.cursor = ScrollCursor::resume(doc);
        if self.coordinator.state() == CoordinatorState::Idle {
            doc.last_access_time = Some(unix_now());
        }
        self.active = Some(id.to_string());
        tracing::info!(
            id,
            chapter = self.cursor.chapter_index(),
            offset = self.cursor.offset(),
            "document selected"
        );
        if reset {
            self.notify_position_reset(id);
        }
        self.redisplay();
        self.coordinator.notify_change(now);
    }

    fn notify_position_reset(&mut self, id: &str) {
        let name = self
            .library
            .get(id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| id.to_string());
        self.prompts.notify(Notice::warning(format!(
            "Saved position in \"{name}\" no longer exists; starting from the first chapter."
        )));
    }

    fn deselect(&mut self) {
        self.reconciler.close();
        self.active = None;
        self.cursor = ScrollCursor::default();
        self.narrow.clear();
    }

    /// Add pasted text as a new document and select it.
    pub fn load_pasted_text(&mut self, content: &str, now: Instant) -> Option<String> {
        if content.is_empty() {
            self.prompts.notify(Notice::warning("Nothing to paste."));
            return None;
        }
        let name = ingest::name_for_paste(content);
        let id = self.library.allocate_id(&name);
        let mut doc = Document::from_pasted(id.clone(), name, content.to_string(), unix_now());
        doc.set_chapters(ingest::segment_pasted(&self.segmenter, content));
        if let Err(e) = self.library.add(doc) {
            self.prompts.notify(Notice::error(e.to_string()));
            return None;
        }
        self.activate(&id, now);
        Some(id)
    }

    pub fn remove_document(&mut self, id: &str, now: Instant) -> LibraryResult<()> {
        self.library.remove(id)?;
        if self.active.as_deref() == Some(id) {
            self.deselect();
        }
        self.coordinator.notify_change(now);
        Ok(())
    }

    /// Remove every document whose source is missing. Returns how many went.
    pub fn cleanup_missing(&mut self, now: Instant) -> usize {
        let removed = self.library.remove_missing();
        if removed.is_empty() {
            self.prompts.notify(Notice::info("No missing documents."));
            return 0;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|active| removed.contains(active))
        {
            self.deselect();
        }
        tracing::info!(removed = removed.len(), "missing documents removed");
        self.prompts.notify(Notice::info(format!(
            "Removed {} missing document(s).",
            removed.len()
        )));
        self.coordinator.notify_change(now);
        removed.len()
    }

    pub fn clear_library(&mut self, now: Instant) {
        self.deselect();
        self.library.clear();
        tracing::info!("library cleared");
        self.coordinator.notify_change(now);
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn library_view(&self) -> Vec<LibraryEntryView> {
        self.library
            .documents()
            .iter()
            .map(|doc| LibraryEntryView {
                id: doc.id.clone(),
                name: doc.name.clone(),
                status: doc.status(),
                chapter_title: doc
                    .last_chapter_index
                    .and_then(|i| doc.chapter(i))
                    .map(|c| c.title.clone()),
                progress: (doc.progress() * 100.0).round() as u8,
                is_current: self.active.as_deref() == Some(doc.id.as_str()),
            })
            .collect()
    }

    /// Chapters of the active document.
    pub fn chapter_view(&self) -> Vec<ChapterEntryView> {
        let Some(doc) = self.active_document() else {
            return Vec::new();
        };
        doc.chapters()
            .iter()
            .enumerate()
            .map(|(index, chapter)| ChapterEntryView {
                index,
                title: chapter.title.clone(),
                is_current: index == self.cursor.chapter_index(),
            })
            .collect()
    }

    fn redisplay(&mut self) {
        let chapter = self
            .active
            .as_deref()
            .and_then(|id| self.library.get(id))
            .and_then(|doc| doc.chapter(self.cursor.chapter_index()));
        match chapter {
            Some(chapter) => {
                let window = self
                    .cursor
                    .visible_window(Some(chapter), self.config.window_width);
                self.narrow.show(&StatusLine {
                    text: window.text,
                    marker: window.marker,
                });
            }
            None => self.narrow.clear(),
        }
    }
}

fn signed(step: usize) -> isize {
    isize::try_from(step).unwrap_or(isize::MAX)
}

/// User-facing message for a document that did not load cleanly.
fn load_notice(doc: &Document, error: Option<LibraryError>) -> Option<Notice> {
    match (doc.status(), error) {
        (_, Some(e)) => Some(Notice::error(format!("Could not read \"{}\": {e}", doc.name))),
        (DocumentStatus::Missing, None) => Some(Notice::warning(format!(
            "Source file for \"{}\" is missing.",
            doc.name
        ))),
        _ => None,
    }
}
