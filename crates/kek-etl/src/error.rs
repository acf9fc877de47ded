//! Error types for the import pipeline.

use thiserror::Error;

/// Errors raised by a [`crate::RevisionSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The version-control tool could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The version-control tool ran but reported failure.
    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    /// A revision listing line could not be understood.
    #[error("cannot parse revision line {line:?}: {message}")]
    Parse { line: String, message: String },

    /// The revision's data files could not be written to the working dir.
    #[error("cannot materialize revision {revision}: {message}")]
    Materialize { revision: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a whole import run.
///
/// Failures confined to one revision never surface here; they are recorded
/// in that revision's [`crate::RevisionOutcome`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("revision source error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Store(#[from] kek_core::Error),
}

/// Convenience alias for whole-run results.
pub type ImportResult<T> = std::result::Result<T, ImportError>;
