//! Event records handed to [`crate::EventLogger`].
//!
//! Every update the account receives that we care about is translated into
//! one of the variants of [`Event`] before it reaches the logger.  Fields
//! that the event source could not provide stay `None` and are filled from
//! the message history or replaced by a placeholder during formatting.

use chrono::{DateTime, Utc};

/// Numeric chat identifier in marked form (see [`marked_chat_id`]).
pub type ChatId = i64;

/// Message identifier within a chat.
pub type MessageId = i32;

const CHANNEL_MARK: i64 = 1_000_000_000_000;

/// Peer kind of a chat, used to fold the raw id into a marked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKind {
    User,
    Group,
    Channel,
}

/// Fold a raw peer id into the marked id space.
///
/// Users keep their id, basic groups are negated and channels/supergroups
/// get the `-100…` prefix, so ids from different peer kinds never collide.
pub fn marked_chat_id(kind: PeerKind, raw_id: i64) -> ChatId {
    match kind {
        PeerKind::User    => raw_id,
        PeerKind::Group   => -raw_id,
        PeerKind::Channel => -(CHANNEL_MARK + raw_id),
    }
}

/// `true` for marked ids of channels and supergroups, whose message ids are
/// only unique within the channel.
pub fn is_channel_id(id: ChatId) -> bool {
    id < -CHANNEL_MARK
}

// ─── ChatRef ──────────────────────────────────────────────────────────────────

/// The chat an event belongs to, as far as the event source knows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRef {
    /// Marked chat id. `None` when the event carried no chat (plain
    /// deletions outside channels) and the history could not fill it in.
    pub id:    Option<ChatId>,
    /// Display title. `None` when the chat is not in the local cache.
    pub title: Option<String>,
}

impl ChatRef {
    pub fn new(id: ChatId, title: Option<String>) -> Self {
        Self { id: Some(id), title }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

// ─── Variants ─────────────────────────────────────────────────────────────────

/// One or more messages were deleted.
#[derive(Debug, Clone)]
pub struct Deletion {
    pub chat:        ChatRef,
    pub message_ids: Vec<MessageId>,
    pub at:          DateTime<Utc>,
}

/// A message was edited.
#[derive(Debug, Clone)]
pub struct Edit {
    pub chat:       ChatRef,
    pub message_id: MessageId,
    /// Text before the edit, when the event source still had it.
    pub old_text:   Option<String>,
    pub new_text:   String,
    pub sender:     Option<String>,
    pub at:         DateTime<Utc>,
}

/// A new message arrived (or was sent from this account).
#[derive(Debug, Clone)]
pub struct Received {
    pub chat:       ChatRef,
    pub message_id: MessageId,
    pub text:       String,
    pub sender:     Option<String>,
    pub at:         DateTime<Utc>,
}

// ─── Event ────────────────────────────────────────────────────────────────────

/// A message event observed on the account.
#[derive(Debug, Clone)]
pub enum Event {
    MessageDeleted(Deletion),
    MessageEdited(Edit),
    NewMessage(Received),
}

impl Event {
    /// Handler name used in diagnostics.
    pub fn handler(&self) -> &'static str {
        match self {
            Self::MessageDeleted(_) => "on_message_deleted",
            Self::MessageEdited(_)  => "on_message_edited",
            Self::NewMessage(_)     => "on_new_message",
        }
    }

    pub fn chat(&self) -> &ChatRef {
        match self {
            Self::MessageDeleted(d) => &d.chat,
            Self::MessageEdited(e)  => &e.chat,
            Self::NewMessage(r)     => &r.chat,
        }
    }

    pub fn message_ids(&self) -> Vec<MessageId> {
        match self {
            Self::MessageDeleted(d) => d.message_ids.clone(),
            Self::MessageEdited(e)  => vec![e.message_id],
            Self::NewMessage(r)     => vec![r.message_id],
        }
    }
}
