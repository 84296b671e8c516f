//! Pure rendering of events into log lines.
//!
//! Every record is exactly one `\n`-terminated line. Free text is written
//! between double quotes exactly as received, except that line breaks become
//! the two characters `\n` / `\r`, so a message can never split a record.
//! Nothing in here touches the file system.

use std::fmt::{self, Display, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::event::{ChatId, ChatRef, Edit, Event, MessageId, Received};
use crate::sink::LogTarget;

/// Title written for chats missing from the local cache.
pub const UNKNOWN_CHAT: &str = "Unknown Chat";
/// Written in place of text we never saw (old text of an edit, text of a
/// deleted message).
pub const UNKNOWN_TEXT: &str = "<unknown>";

// ─── Line ─────────────────────────────────────────────────────────────────────

/// Rendered text and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub target: LogTarget,
    /// One or more complete lines, each ending in `\n`.
    pub text:   String,
}

/// A deleted message after history lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedMessage {
    pub chat:   ChatRef,
    pub id:     MessageId,
    pub text:   Option<String>,
    pub sender: Option<String>,
}

// ─── Field helpers ────────────────────────────────────────────────────────────

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Text in double quotes, verbatim apart from `\n` and `\r`.
struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        let mut rest = self.0;
        while let Some(at) = rest.find(['\n', '\r']) {
            f.write_str(&rest[..at])?;
            f.write_str(if rest.as_bytes()[at] == b'\n' { "\\n" } else { "\\r" })?;
            rest = &rest[at + 1..];
        }
        f.write_str(rest)?;
        f.write_char('"')
    }
}

struct Chat<'a>(&'a ChatRef);

impl Display for Chat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.0.title.as_deref().unwrap_or(UNKNOWN_CHAT);
        write!(f, "chat={} (", Quoted(title))?;
        match self.0.id {
            Some(id) => write!(f, "{id})"),
            None     => write!(f, "?)"),
        }
    }
}

fn optional_text(text: Option<&str>) -> String {
    match text {
        Some(t) => Quoted(t).to_string(),
        None    => UNKNOWN_TEXT.to_string(),
    }
}

fn sender_field(sender: Option<&str>) -> String {
    sender.map(|s| format!(" | from={}", Quoted(s))).unwrap_or_default()
}

// ─── Renderers ────────────────────────────────────────────────────────────────

/// One line per deleted message, grouped into one [`Line`] per chat file in
/// order of first appearance.
pub fn deleted(messages: &[DeletedMessage], at: DateTime<Utc>) -> Vec<Line> {
    let ts = timestamp(at);
    let mut out: Vec<Line> = Vec::new();
    for m in messages {
        let target = LogTarget::Deleted(m.chat.id);
        let line = format!(
            "{ts} | DELETED | {} | msg={}{} | text={}\n",
            Chat(&m.chat),
            m.id,
            sender_field(m.sender.as_deref()),
            optional_text(m.text.as_deref()),
        );
        match out.iter_mut().find(|l| l.target == target) {
            Some(existing) => existing.text.push_str(&line),
            None           => out.push(Line { target, text: line }),
        }
    }
    out
}

pub fn edited(e: &Edit) -> Line {
    Line {
        target: LogTarget::Edited(e.chat.id),
        text: format!(
            "{} | EDITED | {} | msg={}{} | old={} | new={}\n",
            timestamp(e.at),
            Chat(&e.chat),
            e.message_id,
            sender_field(e.sender.as_deref()),
            optional_text(e.old_text.as_deref()),
            Quoted(&e.new_text),
        ),
    }
}

pub fn received(r: &Received) -> Line {
    Line {
        target: LogTarget::Received(r.chat.id),
        text: format!(
            "{} | RECEIVED | {} | msg={}{} | text={}\n",
            timestamp(r.at),
            Chat(&r.chat),
            r.message_id,
            sender_field(r.sender.as_deref()),
            Quoted(&r.text),
        ),
    }
}

/// Diagnostic for an event that could not be logged: the handler, the chat
/// and message ids of the triggering event, and the error on one line.
pub fn error(at: DateTime<Utc>, event: &Event, err: &dyn Display) -> Line {
    let chat = event.chat().id.map_or_else(|| "?".to_string(), |id: ChatId| id.to_string());
    let reason = err.to_string().replace(['\r', '\n'], " ");
    Line {
        target: LogTarget::Errors,
        text: format!(
            "{} | ERROR | {} | chat={chat} | msg={:?} | {reason}\n",
            timestamp(at),
            event.handler(),
            event.message_ids(),
        ),
    }
}
