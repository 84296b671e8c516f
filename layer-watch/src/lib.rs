//! # layer-watch
//!
//! Turns message events observed on a Telegram account into append-only,
//! per-chat log files.
//!
//! ## Layout
//! - [`event`]   — the closed set of events the logger understands
//! - [`history`] — short-lived memory of received messages
//! - [`format`]  — pure event → line rendering
//! - [`sink`]    — where lines are appended (`FileSink` writes `LOG_DIR/*.log`)
//! - [`logger`]  — [`EventLogger`], the three handlers and the error path
//!
//! ```no_run
//! use layer_watch::{EventLogger, FileSink};
//!
//! let logger = EventLogger::new(FileSink::new("logs"));
//! # let _ = logger;
//! ```

#![deny(unsafe_code)]

mod errors;
pub mod event;
pub mod format;
pub mod history;
pub mod logger;
pub mod sink;

pub use errors::{HandleError, SinkError};
pub use event::{ChatId, ChatRef, Deletion, Edit, Event, MessageId, PeerKind, Received, marked_chat_id};
pub use history::{MessageHistory, Remembered};
pub use logger::EventLogger;
pub use sink::{FileSink, LogSink, LogTarget};
