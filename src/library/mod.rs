//! Document library: decoding sources, splitting them into chapters, and
//! keeping the ordered set of loaded documents.
//!
//! Raw text goes through the boundary cascade in [`segment`]; when no boundary
//! fires, [`fallback`] guarantees a non-empty chapter list.

pub mod catalog;
pub mod error;
pub mod fallback;
pub mod ingest;
pub mod model;
pub mod parser;
pub mod segment;

pub use catalog::Library;
pub use error::{LibraryError, LibraryResult};
pub use ingest::{FsLoader, LoadOutcome, SourceLoader};
pub use model::{Chapter, ContentFormat, Document, DocumentStatus, SourceKind};
pub use segment::{ChapterSegmenter, Segmentation};
