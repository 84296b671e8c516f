//! The event logger: turns [`Event`]s into appended log lines.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::errors::{HandleError, SinkError};
use crate::event::{ChatId, ChatRef, Deletion, Edit, Event, Received};
use crate::format::{self, DeletedMessage, Line};
use crate::history::{MessageHistory, Remembered};
use crate::sink::{LogSink, LogTarget};

/// Appends one line per observed message event to a [`LogSink`].
///
/// Handlers never fail: anything that goes wrong while logging an event,
/// including a panic, is written as a single line to the error log and the
/// event is dropped.
pub struct EventLogger<S: LogSink> {
    sink:    S,
    history: Mutex<MessageHistory>,
    allowed: HashSet<ChatId>,
}

impl<S: LogSink> EventLogger<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            history: Mutex::new(MessageHistory::default()),
            allowed: HashSet::new(),
        }
    }

    /// Only log events from these chats. An empty set logs every chat.
    pub fn with_allowed_chats(mut self, chats: impl IntoIterator<Item = ChatId>) -> Self {
        self.allowed = chats.into_iter().collect();
        self
    }

    pub fn sink(&self) -> &S { &self.sink }

    // ── Handlers ───────────────────────────────────────────────────────────

    pub fn on_message_deleted(&self, deletion: Deletion) {
        self.handle(&Event::MessageDeleted(deletion));
    }

    pub fn on_message_edited(&self, edit: Edit) {
        self.handle(&Event::MessageEdited(edit));
    }

    pub fn on_new_message(&self, received: Received) {
        self.handle(&Event::NewMessage(received));
    }

    /// Log `event`, routing any failure to the error log.
    pub fn handle(&self, event: &Event) {
        let outcome = catch_unwind(AssertUnwindSafe(|| match event {
            Event::MessageDeleted(d) => self.log_deleted(d),
            Event::MessageEdited(e)  => self.log_edited(e),
            Event::NewMessage(r)     => self.log_received(r),
        }));
        let result = outcome.unwrap_or_else(|payload| {
            let msg = payload.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HandleError::Panicked(msg))
        });
        if let Err(e) = result {
            self.report(event, &e);
        }
    }

    // ── Per-kind logic ─────────────────────────────────────────────────────

    fn log_deleted(&self, d: &Deletion) -> Result<(), HandleError> {
        // An unknown chat may still resolve through the history.
        if d.chat.id.is_some() && !self.allows(d.chat.id) {
            return Ok(());
        }

        let mut messages: Vec<DeletedMessage> = {
            let mut history = self.history();
            d.message_ids.iter().map(|&id| match history.take(d.chat.id, id) {
                Some((chat_id, seen)) => DeletedMessage {
                    chat:   ChatRef {
                        id:    Some(chat_id),
                        title: d.chat.title.clone().or(seen.chat_title),
                    },
                    id,
                    text:   Some(seen.text),
                    sender: seen.sender,
                },
                None => DeletedMessage { chat: d.chat.clone(), id, text: None, sender: None },
            }).collect()
        };

        messages.retain(|m| self.allows(m.chat.id));

        // Every chat file gets its chance; failures are reported together.
        let mut failed: Vec<_> = format::deleted(&messages, d.at)
            .iter()
            .filter_map(|line| self.write(line).err())
            .collect();
        match failed.len() {
            0 => Ok(()),
            1 => Err(HandleError::Sink(failed.remove(0))),
            _ => Err(HandleError::Sinks(failed)),
        }
    }

    fn log_edited(&self, e: &Edit) -> Result<(), HandleError> {
        if !self.allows(e.chat.id) {
            return Ok(());
        }

        let previous = match e.chat.id {
            Some(chat_id) => self.history().record_edit(chat_id, e.message_id, Remembered {
                seen_at:    e.at,
                text:       e.new_text.clone(),
                sender:     e.sender.clone(),
                chat_title: e.chat.title.clone(),
            }),
            None => None,
        };

        let enriched = match previous {
            Some(p) => Edit {
                chat: ChatRef {
                    id:    e.chat.id,
                    title: e.chat.title.clone().or(p.chat_title),
                },
                old_text: e.old_text.clone().or(Some(p.text)),
                sender:   e.sender.clone().or(p.sender),
                ..e.clone()
            },
            None => e.clone(),
        };

        Ok(self.write(&format::edited(&enriched))?)
    }

    fn log_received(&self, r: &Received) -> Result<(), HandleError> {
        if !self.allows(r.chat.id) {
            return Ok(());
        }

        {
            let mut history = self.history();
            history.sweep(r.at);
            if let Some(chat_id) = r.chat.id {
                history.remember(chat_id, r.message_id, Remembered {
                    seen_at:    r.at,
                    text:       r.text.clone(),
                    sender:     r.sender.clone(),
                    chat_title: r.chat.title.clone(),
                });
            }
        }

        Ok(self.write(&format::received(r))?)
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    /// With an allow-list set, a chat we could not resolve is never on it.
    fn allows(&self, chat: Option<ChatId>) -> bool {
        self.allowed.is_empty() || chat.is_some_and(|id| self.allowed.contains(&id))
    }

    /// The history guard. A handler that panicked while holding it is
    /// reported on its own; later events keep using the history.
    fn history(&self) -> MutexGuard<'_, MessageHistory> {
        self.history.lock().unwrap_or_else(|poisoned| {
            log::warn!("[watch] message history lock was poisoned, recovering");
            self.history.clear_poison();
            poisoned.into_inner()
        })
    }

    fn write(&self, line: &Line) -> Result<(), SinkError> {
        self.sink.append(line.target, &line.text)?;
        log::info!("[watch] logged {}", line.target.file_name());
        Ok(())
    }

    fn report(&self, event: &Event, err: &HandleError) {
        log::error!("[watch] {} failed: {err}", event.handler());
        let line = format::error(Utc::now(), event, err);
        if let Err(e) = self.sink.append(LogTarget::Errors, &line.text) {
            log::error!("[watch] cannot write error log: {e}");
        }
    }
}
