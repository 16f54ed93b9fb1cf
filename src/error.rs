//! Top-level diagnostic error for sidelines.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives next to its code; this enum only carries them through to the CLI
//! with codes and help text intact.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::library::error::LibraryError;
use crate::paths::PathError;
use crate::persist::error::PersistError;
use crate::reader::surface::SurfaceError;

#[derive(Debug, Error, Diagnostic)]
pub enum SidelinesError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error("failed to read input: {source}")]
    #[diagnostic(
        code(sidelines::input),
        help("Check that the path or piped text is readable.")
    )]
    Input {
        #[source]
        source: std::io::Error,
    },

    #[error("chapter {index} does not exist (the document has {count})")]
    #[diagnostic(
        code(sidelines::chapter_out_of_range),
        help("Run `sidelines chapters` to list valid chapter indices.")
    )]
    NoSuchChapter { index: usize, count: usize },
}

pub type SidelinesResult<T> = std::result::Result<T, SidelinesError>;
