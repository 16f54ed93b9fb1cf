//! Diagnostic error types for durable reading state.
//!
//! These never reach the user: the coordinator logs them and carries on,
//! since reading state is best-effort.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("failed to read state store: {path}")]
    #[diagnostic(
        code(sidelines::persist::read),
        help("Check that the data directory exists and is readable.")
    )]
    StoreRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state store: {path}")]
    #[diagnostic(
        code(sidelines::persist::write),
        help("Ensure you have write permissions to the data directory.")
    )]
    StoreWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {message}")]
    #[diagnostic(code(sidelines::persist::serialize))]
    Serialize { what: String, message: String },

    #[error("stored {what} is malformed: {message}")]
    #[diagnostic(
        code(sidelines::persist::deserialize),
        help("The state file may be from an incompatible version. It is ignored at startup and replaced on the next save.")
    )]
    Deserialize { what: String, message: String },
}

pub type PersistResult<T> = std::result::Result<T, PersistError>;
