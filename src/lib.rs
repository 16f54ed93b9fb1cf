// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # sidelines
//!
//! A covert reading engine: long-form text (plain text, PDF, EPUB, HTML or
//! pasted content) is split into chapters and read a few dozen characters at
//! a time through a narrow status surface, with an optional wide panel for
//! the whole chapter.
//!
//! ## Architecture
//!
//! - **Library** (`library`): decoders, the chapter boundary cascade with its
//!   fallback, and the ordered document catalog
//! - **Reader** (`reader`): the canonical scroll cursor, surface contracts,
//!   and reconciliation of the wide panel's percentage-based position
//! - **Persistence** (`persist`): debounced best-effort saves and validated
//!   restore through a two-state coordinator
//!
//! ## Library usage
//!
//! ```no_run
//! use sidelines::library::{ChapterSegmenter, SourceKind};
//! use sidelines::library::fallback::segment_document;
//!
//! let segmenter = ChapterSegmenter::default();
//! let chapters = segment_document(&segmenter, SourceKind::PastedText, "第一章 开端\n正文");
//! assert_eq!(chapters[0].title, "开端");
//! ```

pub mod config;
pub mod error;
pub mod library;
pub mod paths;
pub mod persist;
pub mod reader;
