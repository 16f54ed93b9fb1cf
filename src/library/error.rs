//! Rich diagnostic error types for the reading library.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from library operations.
///
/// Only [`LibraryError::UnsupportedFormat`] and [`LibraryError::DocumentNotFound`]
/// reach the user as failures; decode and I/O errors are turned into a
/// document status at the load boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum LibraryError {
    #[error("document not found: \"{id}\"")]
    #[diagnostic(
        code(sidelines::library::not_found),
        help("No document with this ID is in the library. List documents with `sidelines list`.")
    )]
    DocumentNotFound { id: String },

    #[error("unsupported content format: \"{path}\"")]
    #[diagnostic(
        code(sidelines::library::unsupported_format),
        help(
            "Supported formats are plain text (.txt, .text, .md, .log), pdf, epub and html. \
             Convert the file or paste its text instead."
        )
    )]
    UnsupportedFormat { path: String },

    #[error("parse error in {format} document: {message}")]
    #[diagnostic(
        code(sidelines::library::parse_error),
        help(
            "The document could not be decoded. Verify the file is valid {format} \
             and not corrupted."
        )
    )]
    ParseError { format: String, message: String },

    #[error("duplicate document: \"{id}\" already exists in the library")]
    #[diagnostic(
        code(sidelines::library::duplicate),
        help("A document with this ID or source path is already loaded. Remove it first or re-open to replace it.")
    )]
    Duplicate { id: String },

    #[error("source file is missing: {path}")]
    #[diagnostic(
        code(sidelines::library::source_missing),
        help("The file was moved or deleted. Re-open it from its new location or run `sidelines cleanup-missing`.")
    )]
    SourceMissing { path: String },

    #[error("I/O error: {source}")]
    #[diagnostic(
        code(sidelines::library::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

impl From<std::io::Error> for LibraryError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

/// Convenience alias for library operation results.
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
