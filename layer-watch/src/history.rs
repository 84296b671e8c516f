//! Short-lived memory of recently received messages.
//!
//! Telegram does not tell us what a deleted message said, nor what an edited
//! message said before the edit, and plain deletions outside channels do not
//! even carry the chat.  [`MessageHistory`] remembers every message we saw
//! arrive for a few hours so the logger can fill those gaps.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::event::{ChatId, MessageId, is_channel_id};

/// How long a remembered message is kept, in hours.
pub const DEFAULT_RETENTION_HOURS: i64 = 5;
/// Minimum time between two eviction sweeps, in hours.
pub const DEFAULT_SWEEP_INTERVAL_HOURS: i64 = 1;

// ─── Remembered ───────────────────────────────────────────────────────────────

/// What we know about a message we saw arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remembered {
    /// When the message arrived, or when it was last edited.
    pub seen_at:    DateTime<Utc>,
    pub text:       String,
    pub sender:     Option<String>,
    pub chat_title: Option<String>,
}

// ─── MessageHistory ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MessageHistory {
    entries:        HashMap<(ChatId, MessageId), Remembered>,
    retention:      Duration,
    sweep_interval: Duration,
    last_sweep:     Option<DateTime<Utc>>,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(
            Duration::hours(DEFAULT_RETENTION_HOURS),
            Duration::hours(DEFAULT_SWEEP_INTERVAL_HOURS),
        )
    }
}

impl MessageHistory {
    pub fn new(retention: Duration, sweep_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            retention,
            sweep_interval,
            last_sweep: None,
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Remember a message, replacing anything stored under the same key.
    pub fn remember(&mut self, chat: ChatId, id: MessageId, entry: Remembered) {
        self.entries.insert((chat, id), entry);
    }

    pub fn get(&self, chat: ChatId, id: MessageId) -> Option<&Remembered> {
        self.entries.get(&(chat, id))
    }

    /// Record an edit and return the entry as it was before.
    ///
    /// Sender and chat title carry over from the earlier entry when the edit
    /// does not supply them. Unknown messages are remembered from this point
    /// on so a later edit or deletion still finds them.
    pub fn record_edit(
        &mut self,
        chat:   ChatId,
        id:     MessageId,
        edited: Remembered,
    ) -> Option<Remembered> {
        let previous = self.entries.remove(&(chat, id));
        let merged = match &previous {
            Some(p) => Remembered {
                sender:     edited.sender.or_else(|| p.sender.clone()),
                chat_title: edited.chat_title.or_else(|| p.chat_title.clone()),
                ..edited
            },
            None => edited,
        };
        self.entries.insert((chat, id), merged);
        previous
    }

    /// Forget a deleted message and return what we knew about it.
    ///
    /// Without a chat only non-channel entries are searched: outside channels
    /// message ids are unique per account, inside channels they are not.
    pub fn take(&mut self, chat: Option<ChatId>, id: MessageId) -> Option<(ChatId, Remembered)> {
        let key = match chat {
            Some(c) => (c, id),
            None => *self.entries.keys()
                .find(|(c, m)| *m == id && !is_channel_id(*c))?,
        };
        self.entries.remove(&key).map(|r| (key.0, r))
    }

    /// Evict entries older than the retention window.
    ///
    /// Does nothing if the previous sweep ran less than one sweep interval
    /// ago. Returns the number of evicted entries.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        if let Some(last) = self.last_sweep {
            if now - last < self.sweep_interval {
                return 0;
            }
        }
        self.last_sweep = Some(now);

        // Nothing can be older than a cutoff before the start of time.
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, r| r.seen_at >= cutoff);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            log::info!("[watch] evicted {evicted} messages older than {}h from history", self.retention.num_hours());
        }
        evicted
    }
}
