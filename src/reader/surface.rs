//! Contracts between the reading engine and its host.
//!
//! The host owns all rendering. The engine hands it plain data
//! ([`StatusLine`], list views, [`WideSeed`]) and receives user decisions
//! and wide-panel messages back.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::library::model::DocumentStatus;

/// Errors from the wide panel channel.
#[derive(Debug, Error, Diagnostic)]
pub enum SurfaceError {
    #[error("wide panel has been disposed")]
    #[diagnostic(
        code(sidelines::surface::disposed),
        help("The panel was closed by the host. Reopen it with the toggle command.")
    )]
    Disposed,

    #[error("wide panel channel failed: {message}")]
    #[diagnostic(
        code(sidelines::surface::channel),
        help("The message channel to the panel is broken. Close and reopen the panel.")
    )]
    Channel { message: String },
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// What the narrow, always-visible surface shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    pub text: String,
    pub marker: Option<String>,
}

impl StatusLine {
    /// Single-line rendering: line breaks become spaces, marker appended.
    pub fn render(&self) -> String {
        let text: String = self
            .text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        match &self.marker {
            Some(marker) => format!("{text} [{marker}]"),
            None => text,
        }
    }
}

/// The narrow fixed-width surface.
pub trait NarrowSurface {
    fn show(&mut self, line: &StatusLine);
    fn clear(&mut self);
}

/// Everything the wide panel needs to render a chapter and scroll to the
/// reading position.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSeed {
    pub document_id: String,
    pub chapter_index: usize,
    pub title: String,
    /// The whole flattened chapter.
    pub text: String,
    pub offset: usize,
    /// `offset / len`, in `[0, 1]`.
    pub percentage: f64,
}

/// A scroll position as reported by the wide panel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollReport {
    pub scroll_top: f64,
    pub percentage: f64,
    /// Offset probed at the viewport's top edge, when the panel could.
    pub char_offset: Option<usize>,
}

/// Messages sent from the wide panel to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelMessage {
    Scrolled(ScrollReport),
    /// The user asked to sync the reading position now.
    SyncRequested,
    /// The host tore the panel down.
    Closed,
}

/// The optional wide panel surface.
pub trait WideSurface {
    fn open(&mut self, seed: &WideSeed) -> SurfaceResult<()>;

    /// Whether the panel (and its channel) still exists.
    fn is_alive(&self) -> bool;

    /// Ask the live panel for its current position.
    fn probe_position(&mut self) -> SurfaceResult<ScrollReport>;

    fn dispose(&mut self);
}

/// Answer to "this file is already in the library".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceDecision {
    Replace,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Interactive host services: file picking, confirmations, notices.
pub trait HostPrompts {
    /// Show a file-open dialog. `None` when the user cancels.
    fn pick_file(&mut self) -> Option<PathBuf>;

    fn confirm_replace(&mut self, document_name: &str) -> ReplaceDecision;

    fn notify(&mut self, notice: Notice);
}

/// One row of the library side-panel list.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntryView {
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    pub chapter_title: Option<String>,
    /// Whole-document progress in percent.
    pub progress: u8,
    pub is_current: bool,
}

/// One row of the chapter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntryView {
    pub index: usize,
    pub title: String,
    pub is_current: bool,
}
