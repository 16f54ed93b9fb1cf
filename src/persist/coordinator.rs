//! Session persistence coordinator.
//!
//! A two-state machine. In `Idle`, every mutation re-arms a single trailing
//! debounce; when it fires the whole library plus the active document id is
//! written. In `Restoring`, mutation notifications are ignored so that
//! partially restored state never overwrites what is on disk.
//!
//! Store failures are logged and otherwise ignored.

use std::time::{Duration, Instant};

use crate::library::catalog::Library;
use crate::library::ingest::{self, SourceLoader};
use crate::library::model::{Document, SourceKind};
use crate::library::segment::ChapterSegmenter;
use crate::persist::debounce::Debouncer;
use crate::persist::error::{PersistError, PersistResult};
use crate::persist::record::{DOCUMENTS_KEY, DocumentRecord, SESSION_KEY, SessionRecord};
use crate::persist::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Restoring,
}

/// Library and selection rebuilt from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredState {
    pub library: Library,
    /// Previously active document, only if it restored as usable.
    pub active: Option<String>,
    /// Documents whose stored chapter index was out of range and got reset.
    pub reset: Vec<String>,
}

pub struct PersistenceCoordinator<S: KeyValueStore> {
    store: S,
    state: CoordinatorState,
    debounce: Debouncer,
    writes: usize,
}

impl<S: KeyValueStore> PersistenceCoordinator<S> {
    pub fn new(store: S, delay: Duration) -> Self {
        Self {
            store,
            state: CoordinatorState::Idle,
            debounce: Debouncer::new(delay),
            writes: 0,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of completed writes, for diagnostics.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn has_pending_write(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Note a cursor or library mutation.
    pub fn notify_change(&mut self, now: Instant) {
        match self.state {
            CoordinatorState::Restoring => {
                tracing::trace!("change during restore, not scheduling a write");
            }
            CoordinatorState::Idle => self.debounce.schedule(now),
        }
    }

    /// Write if the debounce deadline has passed. Returns `true` on write.
    pub fn tick(&mut self, now: Instant, library: &Library, active: Option<&str>) -> bool {
        if self.state == CoordinatorState::Restoring || !self.debounce.fire_if_due(now) {
            return false;
        }
        self.save(library, active)
    }

    /// Write immediately if a write is pending.
    pub fn flush(&mut self, library: &Library, active: Option<&str>) -> bool {
        if self.state == CoordinatorState::Restoring || !self.debounce.take_pending() {
            return false;
        }
        self.save(library, active)
    }

    /// Write the library and session now. Failures are logged, not raised.
    pub fn save(&mut self, library: &Library, active: Option<&str>) -> bool {
        match self.write(library, active) {
            Ok(()) => {
                self.writes += 1;
                tracing::debug!(documents = library.len(), active = ?active, "state saved");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save reading state");
                false
            }
        }
    }

    fn write(&mut self, library: &Library, active: Option<&str>) -> PersistResult<()> {
        let records: Vec<DocumentRecord> = library
            .documents()
            .iter()
            .map(DocumentRecord::from_document)
            .collect();
        let documents = serde_json::to_value(&records).map_err(|e| PersistError::Serialize {
            what: "document list".into(),
            message: e.to_string(),
        })?;
        let session = serde_json::to_value(SessionRecord {
            current_file_id: active.map(str::to_string),
        })
        .map_err(|e| PersistError::Serialize {
            what: "session".into(),
            message: e.to_string(),
        })?;
        self.store.set(DOCUMENTS_KEY, documents)?;
        self.store.set(SESSION_KEY, session)
    }

    /// Enter `Restoring`. Any pending write is dropped.
    pub fn begin_restore(&mut self) {
        self.debounce.cancel();
        self.state = CoordinatorState::Restoring;
    }

    /// Back to `Idle`.
    pub fn finish_restore(&mut self) {
        self.state = CoordinatorState::Idle;
    }

    /// Begin, load and finish in one step.
    pub fn restore(
        &mut self,
        loader: &dyn SourceLoader,
        segmenter: &ChapterSegmenter,
    ) -> RestoredState {
        self.begin_restore();
        let restored = self.load_restored(loader, segmenter);
        self.finish_restore();
        restored
    }

    /// Rebuild the library from the store.
    ///
    /// Every document is restored independently: a missing or broken source
    /// affects only its own entry.
    pub fn load_restored(
        &self,
        loader: &dyn SourceLoader,
        segmenter: &ChapterSegmenter,
    ) -> RestoredState {
        let records = self.read_records();
        let mut library = Library::new();
        let mut reset = Vec::new();

        for record in &records {
            let Some(mut doc) = record.to_document() else {
                tracing::warn!(id = %record.id, "stored file document has no path, skipping");
                continue;
            };
            restore_document(&mut doc, loader, segmenter);
            if doc.is_active() && doc.validate_position() {
                tracing::info!(id = %doc.id, "stored chapter out of range, reset to start");
                reset.push(doc.id.clone());
            }
            if let Err(e) = library.add(doc) {
                tracing::warn!(error = %e, "skipping duplicate stored document");
            }
        }

        let active = self
            .read_session()
            .current_file_id
            .filter(|id| library.get(id).is_some_and(Document::is_active));

        tracing::info!(documents = library.len(), active = ?active, "state restored");
        RestoredState {
            library,
            active,
            reset,
        }
    }

    fn read_records(&self) -> Vec<DocumentRecord> {
        let value = match self.store.get(DOCUMENTS_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored documents");
                return Vec::new();
            }
        };
        let Some(items) = value.as_array() else {
            tracing::warn!("stored document list is not an array");
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed document record");
                    None
                }
            })
            .collect()
    }

    fn read_session(&self) -> SessionRecord {
        match self.store.get(SESSION_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "malformed session record");
                SessionRecord::default()
            }),
            Ok(None) => SessionRecord::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session record");
                SessionRecord::default()
            }
        }
    }
}

/// Recompute a restored document's chapters from its source.
fn restore_document(doc: &mut Document, loader: &dyn SourceLoader, segmenter: &ChapterSegmenter) {
    match doc.source_kind {
        SourceKind::PastedText => {
            let text = doc.pasted_text.clone().unwrap_or_default();
            doc.set_chapters(ingest::segment_pasted(segmenter, &text));
        }
        SourceKind::File => {
            let Some(path) = doc.path.clone() else {
                doc.mark_error();
                return;
            };
            let outcome = ingest::load_file(loader, segmenter, &path);
            if let Some(e) = ingest::apply_outcome(doc, outcome) {
                tracing::warn!(id = %doc.id, error = %e, "document restored with error status");
            }
        }
    }
}
