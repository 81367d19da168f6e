use std::collections::HashMap;

use gochat_crypto::shared_key;
use gochat_types::Gender;

use crate::roster::{Roster, RosterEntry};
use crate::store::{ConversationKey, ConversationStore, Message};

/// The participant this client logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub identifier: String,
    pub gender: Gender,
}

/// What happened to an inbound message once it was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Its conversation is open; show it now.
    Visible,
    /// Stored in a background conversation. Carries the new unread count
    /// for private threads; the shared room keeps no count.
    Background(Option<u32>),
}

/// All client-side state for one logged-in participant.
///
/// Owned by the dispatcher; the renderer only reads it.
#[derive(Debug)]
pub struct Session {
    local: LocalUser,
    selected: ConversationKey,
    store: ConversationStore,
    roster: Roster,
    unread: HashMap<String, u32>,
}

impl Session {
    pub fn new(identifier: impl Into<String>, gender: Gender) -> Self {
        let identifier = identifier.into();
        Self {
            roster: Roster::new(identifier.clone()),
            local: LocalUser { identifier, gender },
            selected: ConversationKey::Public,
            store: ConversationStore::new(),
            unread: HashMap::new(),
        }
    }

    pub fn local(&self) -> &LocalUser {
        &self.local
    }

    pub(crate) fn set_gender(&mut self, gender: Gender) {
        self.local.gender = gender;
    }

    pub fn selected(&self) -> &ConversationKey {
        &self.selected
    }

    pub fn is_selected(&self, key: &ConversationKey) -> bool {
        self.selected == *key
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn unread(&self, identifier: &str) -> u32 {
        self.unread.get(identifier).copied().unwrap_or(0)
    }

    /// Transposition key for the private thread with `partner`.
    pub fn key_with(&self, partner: &str) -> String {
        shared_key(&self.local.identifier, partner)
    }

    /// Open a conversation. Opening a private thread clears its unread count.
    pub fn select(&mut self, key: ConversationKey) {
        if let ConversationKey::Private(id) = &key {
            self.unread.remove(id);
        }
        self.selected = key;
    }

    pub fn replace_roster<I>(&mut self, snapshot: I)
    where
        I: IntoIterator<Item = RosterEntry>,
    {
        self.roster.replace_snapshot(snapshot);
    }

    pub(crate) fn clear_roster(&mut self) {
        self.roster.clear();
    }

    pub fn record_public(&mut self, message: Message) -> Arrival {
        self.store.append(ConversationKey::Public, message);
        if self.is_selected(&ConversationKey::Public) {
            Arrival::Visible
        } else {
            Arrival::Background(None)
        }
    }

    /// Store a private message received from `partner`.
    pub fn record_private(&mut self, partner: &str, message: Message) -> Arrival {
        let key = ConversationKey::private(partner);
        self.store.append(key.clone(), message);
        if self.is_selected(&key) {
            return Arrival::Visible;
        }

        let count = self.unread.entry(partner.to_string()).or_insert(0);
        *count += 1;
        Arrival::Background(Some(*count))
    }

    /// Store a private message the local user sent to `partner`.
    pub fn record_outgoing(&mut self, partner: &str, message: Message) {
        self.store.append(ConversationKey::private(partner), message);
    }
}

#[cfg(test)]
mod tests {
    use gochat_types::{ChatMessage, MessageType};

    use super::*;
    use crate::store::Content;

    fn from(sender: &str, text: &str) -> Message {
        Message::from_wire(
            ChatMessage::chat(sender, "ciphertext").with_recipient("alice"),
            Content::Plain(text.to_string()),
        )
    }

    #[test]
    fn starts_in_public_room() {
        let session = Session::new("alice", Gender::Female);
        assert_eq!(session.selected(), &ConversationKey::Public);
        assert_eq!(session.local().identifier, "alice");
    }

    #[test]
    fn background_private_messages_count_as_unread() {
        let mut session = Session::new("alice", Gender::Female);
        session.select(ConversationKey::private("carol"));

        assert_eq!(session.record_private("bob", from("bob", "one")), Arrival::Background(Some(1)));
        assert_eq!(session.record_private("bob", from("bob", "two")), Arrival::Background(Some(2)));
        assert_eq!(session.unread("bob"), 2);
        assert_eq!(session.store().len(&ConversationKey::private("bob")), 2);
    }

    #[test]
    fn selecting_resets_unread_idempotently() {
        let mut session = Session::new("alice", Gender::Female);
        session.record_private("bob", from("bob", "hey"));
        assert_eq!(session.unread("bob"), 1);

        session.select(ConversationKey::private("bob"));
        assert_eq!(session.unread("bob"), 0);
        session.select(ConversationKey::private("bob"));
        assert_eq!(session.unread("bob"), 0);

        assert_eq!(session.record_private("bob", from("bob", "again")), Arrival::Visible);
        assert_eq!(session.unread("bob"), 0);

        session.select(ConversationKey::Public);
        session.record_private("bob", from("bob", "later"));
        assert_eq!(session.unread("bob"), 1);
    }

    #[test]
    fn public_messages_show_only_when_room_is_open() {
        let mut session = Session::new("alice", Gender::Female);
        let join = Message::from_wire(ChatMessage::join("bob", Gender::Male), Content::Empty);
        assert_eq!(session.record_public(join.clone()), Arrival::Visible);

        session.select(ConversationKey::private("bob"));
        assert_eq!(session.record_public(join), Arrival::Background(None));
        assert_eq!(session.store().len(&ConversationKey::Public), 2);
        assert_eq!(
            session.store().messages_for(&ConversationKey::Public)[0].kind,
            MessageType::Join
        );
    }

    #[test]
    fn outgoing_messages_do_not_touch_unread() {
        let mut session = Session::new("alice", Gender::Female);
        session.record_outgoing("bob", from("alice", "hi"));
        assert_eq!(session.unread("bob"), 0);
        assert_eq!(session.store().len(&ConversationKey::private("bob")), 1);
    }

    #[test]
    fn key_is_shared_with_partner() {
        let alice = Session::new("alice", Gender::Female);
        let bob = Session::new("bob", Gender::Male);
        assert_eq!(alice.key_with("bob"), bob.key_with("alice"));
        assert_eq!(alice.key_with("bob"), "alicebob");
    }
}
