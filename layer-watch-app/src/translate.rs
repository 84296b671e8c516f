//! Boundary between `layer-client` updates and [`layer_watch::Event`]s.

use chrono::Utc;
use layer_client::Client;
use layer_client::update::{IncomingMessage, MessageDeletion, Update};
use layer_tl_types as tl;
use layer_watch::{ChatRef, Deletion, Edit, Event, PeerKind, Received, marked_chat_id};

use crate::directory::{ChatDirectory, chat_id_of};

/// Turns client updates into events, resolving names on the way.
pub struct Translator {
    client:    Client,
    directory: ChatDirectory,
    /// How our own messages are attributed.
    me:        Option<String>,
}

impl Translator {
    pub fn new(client: Client, directory: ChatDirectory, me: Option<String>) -> Self {
        Self { client, directory, me }
    }

    /// `None` for updates the logger does not care about.
    pub async fn translate(&mut self, update: Update) -> Option<Event> {
        match update {
            Update::NewMessage(msg) => {
                let (chat, sender) = self.describe(&msg).await;
                Some(Event::NewMessage(Received {
                    chat,
                    message_id: msg.id(),
                    text:       msg.text().unwrap_or_default().to_string(),
                    sender,
                    at:         Utc::now(),
                }))
            }
            Update::MessageEdited(msg) => {
                let (chat, sender) = self.describe(&msg).await;
                Some(Event::MessageEdited(Edit {
                    chat,
                    message_id: msg.id(),
                    old_text:   None,
                    new_text:   msg.text().unwrap_or_default().to_string(),
                    sender,
                    at:         Utc::now(),
                }))
            }
            Update::MessageDeleted(del) => Some(Event::MessageDeleted(self.deletion(del).await)),
            _ => None,
        }
    }

    async fn describe(&mut self, msg: &IncomingMessage) -> (ChatRef, Option<String>) {
        let chat = match msg.peer_id() {
            Some(peer) => {
                let id = chat_id_of(peer);
                ChatRef::new(id, self.directory.resolve_title(&self.client, id).await)
            }
            None => ChatRef::unknown(),
        };
        let sender = attribute(
            &self.directory,
            msg.sender_id(),
            msg.peer_id(),
            msg.outgoing(),
            self.me.as_deref(),
        );
        (chat, sender)
    }

    /// Plain deletions carry no chat; only channel deletions do.
    async fn deletion(&mut self, del: MessageDeletion) -> Deletion {
        let chat = match del.channel_id {
            Some(channel) => {
                let id = marked_chat_id(PeerKind::Channel, channel);
                ChatRef::new(id, self.directory.resolve_title(&self.client, id).await)
            }
            None => ChatRef::unknown(),
        };
        Deletion { chat, message_ids: del.message_ids, at: Utc::now() }
    }
}

/// Who a message is attributed to: its sender, else ourselves for outgoing
/// messages, else the chat peer (private chats carry no sender).
fn attribute(
    directory: &ChatDirectory,
    sender:    Option<&tl::enums::Peer>,
    peer:      Option<&tl::enums::Peer>,
    outgoing:  bool,
    me:        Option<&str>,
) -> Option<String> {
    match sender {
        Some(s) => Some(directory.sender(s)),
        None if outgoing => me.map(str::to_string),
        None => peer.map(|p| directory.sender(p)),
    }
}
