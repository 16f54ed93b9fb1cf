//! Cross-surface reconciliation.
//!
//! The narrow surface renders straight from the canonical cursor. The wide
//! panel renders the whole chapter and reports percentages (and, when it can,
//! a probed character offset). Its reports are cached here and only turned
//! into a canonical offset at commit points: close, explicit sync, or a
//! forced close before the active document or chapter changes.

use crate::library::model::Chapter;
use crate::reader::surface::{ScrollReport, SurfaceResult, WideSeed, WideSurface};

/// Last position reported by the open panel.
pub type ScrollCache = ScrollReport;

/// The document/chapter a wide panel session was opened on.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSession {
    pub document_id: String,
    pub chapter_index: usize,
    pub chapter_len: usize,
    pub cache: ScrollCache,
}

/// A reconciled position, ready to be written into the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub document_id: String,
    pub chapter_index: usize,
    pub offset: usize,
}

/// Turn a cached report into a character offset.
///
/// A non-zero probed offset wins; otherwise `floor(percentage × len)`.
/// The result is not clamped; the cursor clamps on commit.
pub fn resolve_offset(cache: &ScrollCache, chapter_len: usize) -> usize {
    match cache.char_offset {
        Some(offset) if offset > 0 => offset,
        _ => {
            let pct = if cache.percentage.is_finite() {
                cache.percentage.clamp(0.0, 1.0)
            } else {
                0.0
            };
            (pct * chapter_len as f64).floor() as usize
        }
    }
}

/// Owns the wide panel and its cached scroll state.
pub struct Reconciler {
    surface: Box<dyn WideSurface>,
    session: Option<WideSession>,
}

impl Reconciler {
    pub fn new(surface: Box<dyn WideSurface>) -> Self {
        Self {
            surface,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&WideSession> {
        self.session.as_ref()
    }

    /// Open the panel on a chapter, seeded with the canonical offset.
    pub fn open(
        &mut self,
        document_id: &str,
        chapter_index: usize,
        chapter: &Chapter,
        offset: usize,
    ) -> SurfaceResult<()> {
        let chapter_len = chapter.flattened_len();
        let percentage = if chapter_len == 0 {
            0.0
        } else {
            offset as f64 / chapter_len as f64
        };
        let seed = WideSeed {
            document_id: document_id.to_string(),
            chapter_index,
            title: chapter.title.clone(),
            text: chapter.flattened(),
            offset,
            percentage,
        };
        self.surface.open(&seed)?;
        tracing::debug!(
            document = document_id,
            chapter = chapter_index,
            offset,
            "wide panel opened"
        );
        self.session = Some(WideSession {
            document_id: document_id.to_string(),
            chapter_index,
            chapter_len,
            cache: ScrollCache {
                scroll_top: 0.0,
                percentage,
                char_offset: Some(offset),
            },
        });
        Ok(())
    }

    /// Record a scroll report. The canonical cursor is not touched.
    pub fn on_scroll(&mut self, report: ScrollReport) {
        if let Some(session) = self.session.as_mut() {
            session.cache = report;
        }
    }

    /// Reconcile the cached position without closing the panel.
    pub fn sync(&self) -> Option<Commit> {
        self.session.as_ref().map(commit_for)
    }

    /// Close the panel and reconcile its last position.
    ///
    /// A live panel is probed once for a final report; a torn-down panel is
    /// never messaged and the cached report is used as-is.
    pub fn close(&mut self) -> Option<Commit> {
        let mut session = self.session.take()?;
        if self.surface.is_alive() {
            match self.surface.probe_position() {
                Ok(report) => session.cache = report,
                Err(e) => {
                    tracing::warn!(error = %e, "wide panel probe failed, using cached position")
                }
            }
            self.surface.dispose();
        }
        let commit = commit_for(&session);
        tracing::debug!(
            document = %commit.document_id,
            chapter = commit.chapter_index,
            offset = commit.offset,
            "wide panel closed"
        );
        Some(commit)
    }
}

fn commit_for(session: &WideSession) -> Commit {
    Commit {
        document_id: session.document_id.clone(),
        chapter_index: session.chapter_index,
        offset: resolve_offset(&session.cache, session.chapter_len),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::reader::surface::SurfaceError;

    #[derive(Default)]
    struct PanelLog {
        seeds: Vec<WideSeed>,
        alive: bool,
        probe: Option<ScrollReport>,
        probes: usize,
        disposed: usize,
    }

    struct FakePanel(Rc<RefCell<PanelLog>>);

    impl WideSurface for FakePanel {
        fn open(&mut self, seed: &WideSeed) -> SurfaceResult<()> {
            let mut log = self.0.borrow_mut();
            log.seeds.push(seed.clone());
            log.alive = true;
            Ok(())
        }

        fn is_alive(&self) -> bool {
            self.0.borrow().alive
        }

        fn probe_position(&mut self) -> SurfaceResult<ScrollReport> {
            let mut log = self.0.borrow_mut();
            log.probes += 1;
            log.probe.ok_or(SurfaceError::Channel {
                message: "no answer".into(),
            })
        }

        fn dispose(&mut self) {
            let mut log = self.0.borrow_mut();
            log.disposed += 1;
            log.alive = false;
        }
    }

    fn chapter_of_len(len: usize) -> Chapter {
        Chapter {
            title: "c".into(),
            content: vec!["x".repeat(len)],
        }
    }

    fn reconciler() -> (Reconciler, Rc<RefCell<PanelLog>>) {
        let log = Rc::new(RefCell::new(PanelLog::default()));
        (Reconciler::new(Box::new(FakePanel(log.clone()))), log)
    }

    #[test]
    fn percentage_path_when_probe_is_zero() {
        let cache = ScrollCache {
            scroll_top: 1200.0,
            percentage: 0.62,
            char_offset: Some(0),
        };
        assert_eq!(resolve_offset(&cache, 1000), 620);
    }

    #[test]
    fn probed_offset_preferred() {
        let cache = ScrollCache {
            scroll_top: 10.0,
            percentage: 0.62,
            char_offset: Some(333),
        };
        assert_eq!(resolve_offset(&cache, 1000), 333);
    }

    #[test]
    fn bad_percentage_is_zero() {
        let cache = ScrollCache {
            scroll_top: 0.0,
            percentage: f64::NAN,
            char_offset: None,
        };
        assert_eq!(resolve_offset(&cache, 1000), 0);
    }

    #[test]
    fn open_seeds_offset_and_percentage() {
        let (mut rec, log) = reconciler();
        rec.open("doc", 2, &chapter_of_len(1000), 250).unwrap();
        let seed = log.borrow().seeds[0].clone();
        assert_eq!(seed.offset, 250);
        assert!((seed.percentage - 0.25).abs() < 1e-9);
        assert_eq!(seed.text.chars().count(), 1000);
        assert!(rec.is_open());
    }

    #[test]
    fn scrolls_only_update_cache() {
        let (mut rec, _log) = reconciler();
        rec.open("doc", 0, &chapter_of_len(1000), 0).unwrap();
        rec.on_scroll(ScrollReport {
            scroll_top: 5.0,
            percentage: 0.1,
            char_offset: Some(100),
        });
        rec.on_scroll(ScrollReport {
            scroll_top: 50.0,
            percentage: 0.5,
            char_offset: None,
        });
        assert_eq!(rec.sync().unwrap().offset, 500);
        assert!(rec.is_open());
    }

    #[test]
    fn close_on_torn_down_panel_uses_cache() {
        let (mut rec, log) = reconciler();
        rec.open("doc", 0, &chapter_of_len(1000), 0).unwrap();
        rec.on_scroll(ScrollReport {
            scroll_top: 900.0,
            percentage: 0.62,
            char_offset: Some(0),
        });
        log.borrow_mut().alive = false;

        let commit = rec.close().unwrap();
        assert_eq!(commit.offset, 620);
        assert_eq!(log.borrow().probes, 0);
        assert_eq!(log.borrow().disposed, 0);
        assert!(!rec.is_open());
    }

    #[test]
    fn close_on_live_panel_probes_once() {
        let (mut rec, log) = reconciler();
        rec.open("doc", 0, &chapter_of_len(1000), 0).unwrap();
        log.borrow_mut().probe = Some(ScrollReport {
            scroll_top: 1.0,
            percentage: 0.9,
            char_offset: Some(870),
        });
        let commit = rec.close().unwrap();
        assert_eq!(commit.offset, 870);
        assert_eq!(log.borrow().probes, 1);
        assert_eq!(log.borrow().disposed, 1);
    }

    #[test]
    fn failed_probe_falls_back_to_cache() {
        let (mut rec, _log) = reconciler();
        rec.open("doc", 0, &chapter_of_len(200), 0).unwrap();
        rec.on_scroll(ScrollReport {
            scroll_top: 1.0,
            percentage: 0.5,
            char_offset: None,
        });
        assert_eq!(rec.close().unwrap().offset, 100);
    }

    #[test]
    fn close_when_not_open_is_none() {
        let (mut rec, _log) = reconciler();
        assert!(rec.close().is_none());
        assert!(rec.sync().is_none());
    }
}
