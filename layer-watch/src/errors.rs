//! Error types for layer-watch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ─── SinkError ────────────────────────────────────────────────────────────────

/// A log line could not be appended.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

// ─── HandleError ──────────────────────────────────────────────────────────────

/// Why a single event could not be logged.
///
/// Never escapes [`crate::EventLogger`]; it is rendered into `errors.log`.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Several log files of one event failed; the others were written.
    #[error("{}", joined(.0))]
    Sinks(Vec<SinkError>),

    /// The handler panicked; the payload message if it was a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

fn joined(errors: &[SinkError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
