//! Append-only log destinations.
//!
//! The [`LogSink`] trait abstracts over where formatted lines end up so that
//! callers can swap the on-disk [`FileSink`] for an in-memory or failing sink
//! in tests.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::errors::SinkError;
use crate::event::ChatId;

// ─── LogTarget ────────────────────────────────────────────────────────────────

/// One append-only destination: an (event kind, chat) pair or the shared
/// error log. `None` chat ids are chats we could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTarget {
    Deleted(Option<ChatId>),
    Edited(Option<ChatId>),
    Received(Option<ChatId>),
    Errors,
}

impl LogTarget {
    /// File name of this target inside the log directory.
    pub fn file_name(&self) -> String {
        fn chat(id: &Option<ChatId>) -> String {
            id.map_or_else(|| "unknown".to_string(), |id| id.to_string())
        }
        match self {
            Self::Deleted(id)  => format!("deleted_messages_{}.log", chat(id)),
            Self::Edited(id)   => format!("edited_messages_{}.log", chat(id)),
            Self::Received(id) => format!("received_messages_{}.log", chat(id)),
            Self::Errors       => "errors.log".to_string(),
        }
    }
}

// ─── Trait ────────────────────────────────────────────────────────────────────

/// Somewhere formatted log lines can be appended to.
pub trait LogSink: Send + Sync {
    /// Append `text` (one or more complete `\n`-terminated lines) to `target`.
    ///
    /// Implementations must write `text` as one unit: two concurrent appends
    /// to the same target never interleave.
    fn append(&self, target: LogTarget, text: &str) -> Result<(), SinkError>;
}

// ─── FileSink ─────────────────────────────────────────────────────────────────

/// Writes every target to its own file under a log directory.
///
/// The directory is created on first use. File handles are opened lazily and
/// kept open for the life of the sink; a handle whose write failed is dropped
/// so the next append reopens it.
pub struct FileSink {
    dir:     PathBuf,
    handles: Mutex<HashMap<LogTarget, File>>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), handles: Mutex::new(HashMap::new()) }
    }

    /// Full path of `target` inside the log directory.
    pub fn path_of(&self, target: LogTarget) -> PathBuf {
        self.dir.join(target.file_name())
    }

    fn open(&self, target: LogTarget) -> Result<File, SinkError> {
        fs::create_dir_all(&self.dir).map_err(|source| SinkError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_of(target);
        log::debug!("[watch] opening {}", path.display());
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open { path, source })
    }
}

impl LogSink for FileSink {
    fn append(&self, target: LogTarget, text: &str) -> Result<(), SinkError> {
        // The table stays consistent even if an append panicked mid-way.
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);

        let file = match handles.entry(target) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e)   => e.insert(self.open(target)?),
        };

        if let Err(source) = file.write_all(text.as_bytes()).and_then(|_| file.flush()) {
            handles.remove(&target);
            return Err(SinkError::Write { path: self.path_of(target), source });
        }
        Ok(())
    }
}
