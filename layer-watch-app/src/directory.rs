//! Chat titles and user names, as far as this account's dialogs know them.
//!
//! Updates only carry peer ids, so names are looked up here. The table is
//! filled from the dialog list at startup and refilled on a miss, at most
//! once per [`REFRESH_COOLDOWN`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use layer_client::{Client, Dialog, InvocationError};
use layer_tl_types as tl;
use layer_watch::{ChatId, PeerKind, marked_chat_id};

/// Dialogs fetched per refresh (Telegram's page limit).
const DIALOG_LIMIT: i32 = 100;
/// Minimum time between two refreshes triggered by lookup misses.
pub const REFRESH_COOLDOWN: Duration = Duration::from_secs(60);

/// Marked chat id of a peer.
pub fn chat_id_of(peer: &tl::enums::Peer) -> ChatId {
    match peer {
        tl::enums::Peer::User(u)    => marked_chat_id(PeerKind::User, u.user_id),
        tl::enums::Peer::Chat(c)    => marked_chat_id(PeerKind::Group, c.chat_id),
        tl::enums::Peer::Channel(c) => marked_chat_id(PeerKind::Channel, c.channel_id),
    }
}

/// How a user is shown in log lines: `@username`, else the full name.
pub fn user_display(
    username:   Option<&str>,
    first_name: Option<&str>,
    last_name:  Option<&str>,
) -> Option<String> {
    if let Some(u) = username.filter(|u| !u.is_empty()) {
        return Some(format!("@{u}"));
    }
    let name = format!("{} {}", first_name.unwrap_or(""), last_name.unwrap_or(""))
        .trim()
        .to_string();
    (!name.is_empty()).then_some(name)
}

fn user_display_of(u: &tl::types::User) -> Option<String> {
    user_display(u.username.as_deref(), u.first_name.as_deref(), u.last_name.as_deref())
}

// ─── ChatDirectory ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ChatDirectory {
    titles:       HashMap<ChatId, String>,
    users:        HashMap<i64, String>,
    last_refresh: Option<Instant>,
}

impl ChatDirectory {
    pub fn insert_chat(&mut self, id: ChatId, title: impl Into<String>) {
        self.titles.insert(id, title.into());
    }

    pub fn insert_user(&mut self, user: &tl::types::User) {
        if let Some(name) = user_display_of(user) {
            self.users.insert(user.id, name);
        }
    }

    pub fn title(&self, id: ChatId) -> Option<&str> {
        self.titles.get(&id).map(String::as_str)
    }

    pub fn user(&self, user_id: i64) -> Option<&str> {
        self.users.get(&user_id).map(String::as_str)
    }

    /// Display name of a message sender; `user#<id>` for unknown users.
    pub fn sender(&self, peer: &tl::enums::Peer) -> String {
        match peer {
            tl::enums::Peer::User(u) => self.user(u.user_id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("user#{}", u.user_id)),
            other => {
                let id = chat_id_of(other);
                self.title(id).map(str::to_string).unwrap_or_else(|| format!("chat#{id}"))
            }
        }
    }

    fn ingest(&mut self, dialog: &Dialog) {
        let Some(peer) = dialog.peer() else { return };
        self.insert_chat(chat_id_of(peer), dialog.title());
        if let Some(tl::enums::User::User(u)) = &dialog.entity {
            self.insert_user(u);
        }
    }

    /// Reload titles and names from the most recent dialogs.
    pub async fn refresh(&mut self, client: &Client) -> Result<(), InvocationError> {
        self.last_refresh = Some(Instant::now());
        let dialogs = client.get_dialogs(DIALOG_LIMIT).await?;
        for d in &dialogs {
            self.ingest(d);
        }
        log::debug!("[watch] directory holds {} chats, {} users", self.titles.len(), self.users.len());
        Ok(())
    }

    /// `true` when a lookup miss may trigger another refresh.
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.last_refresh
            .is_none_or(|last| now.duration_since(last) >= REFRESH_COOLDOWN)
    }

    /// Title of `id`, refreshing once from the server on a miss if the
    /// cooldown has passed. A failed refresh counts as a miss.
    pub async fn resolve_title(&mut self, client: &Client, id: ChatId) -> Option<String> {
        if let Some(t) = self.title(id) {
            return Some(t.to_string());
        }
        if !self.refresh_due(Instant::now()) {
            return None;
        }
        if let Err(e) = self.refresh(client).await {
            log::warn!("[watch] dialog refresh failed: {e}");
            return None;
        }
        self.title(id).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peers_map_to_marked_ids() {
        let user    = tl::enums::Peer::User(tl::types::PeerUser { user_id: 5 });
        let group   = tl::enums::Peer::Chat(tl::types::PeerChat { chat_id: 6 });
        let channel = tl::enums::Peer::Channel(tl::types::PeerChannel { channel_id: 7 });
        assert_eq!(chat_id_of(&user), 5);
        assert_eq!(chat_id_of(&group), -6);
        assert_eq!(chat_id_of(&channel), -1_000_000_000_007);
    }

    #[test]
    fn user_display_prefers_username() {
        assert_eq!(user_display(Some("bob"), Some("Bob"), None).as_deref(), Some("@bob"));
        assert_eq!(user_display(Some(""), Some("Ann"), Some("Lee")).as_deref(), Some("Ann Lee"));
        assert_eq!(user_display(None, Some("Ann"), None).as_deref(), Some("Ann"));
        assert_eq!(user_display(None, None, None), None);
    }

    #[test]
    fn sender_falls_back_to_ids() {
        let mut dir = ChatDirectory::default();
        dir.insert_chat(-1_000_000_000_007, "News");
        let channel = tl::enums::Peer::Channel(tl::types::PeerChannel { channel_id: 7 });
        let stranger = tl::enums::Peer::User(tl::types::PeerUser { user_id: 99 });
        assert_eq!(dir.sender(&channel), "News");
        assert_eq!(dir.sender(&stranger), "user#99");
    }

    #[test]
    fn refresh_cooldown() {
        let dir = ChatDirectory::default();
        assert!(dir.refresh_due(Instant::now()));

        let dir = ChatDirectory { last_refresh: Some(Instant::now()), ..Default::default() };
        assert!(!dir.refresh_due(Instant::now()));
        assert!(dir.refresh_due(Instant::now() + REFRESH_COOLDOWN));
    }
}
