//! Pure state-to-view computation.
//!
//! Nothing here mutates the session; output bindings call [`render`] (or the
//! finer-grained helpers) after every update and draw the result however
//! they like.

use serde::Serialize;

use gochat_types::{Gender, MessageType};

use crate::session::Session;
use crate::store::{Content, ConversationKey, Message};

pub const PUBLIC_ROOM_LABEL: &str = "Public Lounge";

/// Shown in place of a private message that could not be decoded.
pub const UNDECIPHERABLE: &str = "[undecipherable message]";

/// Avatar colour token and category glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvatarStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

pub fn avatar_style(gender: Gender) -> AvatarStyle {
    match gender {
        Gender::Male => AvatarStyle { color: "male", icon: "♂" },
        Gender::Female => AvatarStyle { color: "female", icon: "♀" },
        Gender::Other => AvatarStyle { color: "other", icon: "⚧" },
    }
}

/// Style of the public room entry.
pub const PUBLIC_AVATAR: AvatarStyle = AvatarStyle {
    color: "public",
    icon: "P",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosterItem {
    Public {
        label: &'static str,
        avatar: AvatarStyle,
        active: bool,
    },
    User {
        identifier: String,
        initial: String,
        gender: Gender,
        avatar: AvatarStyle,
        /// Hidden by bindings when zero.
        unread: u32,
        active: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageLine {
    /// Presence notices.
    Event { text: String },
    Chat {
        sender: String,
        initial: String,
        avatar: AvatarStyle,
        content: String,
        timestamp: Option<String>,
        /// Sent by the local user.
        own: bool,
    },
}

/// Everything a binding needs to draw both panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub title: String,
    /// Private conversations show the encryption indicator.
    pub encrypted: bool,
    pub online_count: usize,
    pub online_label: String,
    pub roster: Vec<RosterItem>,
    pub messages: Vec<MessageLine>,
}

pub fn render(session: &Session, filter: &str) -> View {
    let selected = session.selected();
    let (title, encrypted) = match selected {
        ConversationKey::Public => (PUBLIC_ROOM_LABEL.to_string(), false),
        ConversationKey::Private(id) => (format!("Private: {id}"), true),
    };
    let online_count = session.roster().len();

    View {
        title,
        encrypted,
        online_count,
        online_label: format!("{online_count} Online"),
        roster: roster_items(session, filter),
        messages: session
            .store()
            .messages_for(selected)
            .iter()
            .map(|m| message_line(session, m))
            .collect(),
    }
}

/// Roster panel: the public room first, then online users whose identifier
/// contains `filter` (case-insensitive), in snapshot order.
pub fn roster_items(session: &Session, filter: &str) -> Vec<RosterItem> {
    let needle = filter.to_lowercase();
    let selected = session.selected();

    let mut items = vec![RosterItem::Public {
        label: PUBLIC_ROOM_LABEL,
        avatar: PUBLIC_AVATAR,
        active: *selected == ConversationKey::Public,
    }];

    items.extend(
        session
            .roster()
            .iter()
            .filter(|entry| entry.identifier.to_lowercase().contains(&needle))
            .map(|entry| RosterItem::User {
                identifier: entry.identifier.clone(),
                initial: initial(&entry.identifier),
                gender: entry.gender,
                avatar: avatar_style(entry.gender),
                unread: session.unread(&entry.identifier),
                active: selected.identifier() == Some(entry.identifier.as_str()),
            }),
    );

    items
}

pub fn message_line(session: &Session, message: &Message) -> MessageLine {
    match message.kind {
        MessageType::Join => MessageLine::Event {
            text: format!("{} joined the secure line.", message.sender),
        },
        MessageType::Leave => MessageLine::Event {
            text: format!("{} disconnected.", message.sender),
        },
        MessageType::Chat => {
            let local = session.local();
            let own = message.sender == local.identifier;
            let gender = if own {
                local.gender
            } else {
                session
                    .roster()
                    .get(&message.sender)
                    .map_or(Gender::Other, |entry| entry.gender)
            };
            let content = match &message.content {
                Content::Plain(text) => text.clone(),
                Content::Empty => String::new(),
                Content::Undecipherable => UNDECIPHERABLE.to_string(),
            };

            MessageLine::Chat {
                sender: message.sender.clone(),
                initial: initial(&message.sender),
                avatar: avatar_style(gender),
                content,
                timestamp: message.timestamp.clone(),
                own,
            }
        }
    }
}

fn initial(identifier: &str) -> String {
    identifier.chars().next().map(String::from).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use gochat_types::ChatMessage;

    use super::*;
    use crate::roster::RosterEntry;

    fn session() -> Session {
        let mut session = Session::new("alice", Gender::Female);
        session.replace_roster([
            RosterEntry::new("bob", Gender::Male),
            RosterEntry::new("Carol", Gender::Female),
            RosterEntry::new("dave", Gender::Other),
        ]);
        session
    }

    fn identifiers(items: &[RosterItem]) -> Vec<&str> {
        items
            .iter()
            .filter_map(|item| match item {
                RosterItem::User { identifier, .. } => Some(identifier.as_str()),
                RosterItem::Public { .. } => None,
            })
            .collect()
    }

    #[test]
    fn public_room_always_first() {
        let items = roster_items(&session(), "zzz");
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], RosterItem::Public { active: true, .. }));
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let session = session();
        assert_eq!(
            identifiers(&roster_items(&session, "")),
            ["bob", "Carol", "dave"]
        );
        assert_eq!(identifiers(&roster_items(&session, "car")), ["Carol"]);
        assert_eq!(identifiers(&roster_items(&session, "A")), ["Carol", "dave"]);
    }

    #[test]
    fn roster_shows_badges_and_selection() {
        let mut session = session();
        let wire = ChatMessage::chat("bob", "x").with_recipient("alice");
        let message = Message::from_wire(wire, Content::Plain("hey".into()));
        session.record_private("bob", message);
        session.select(ConversationKey::private("dave"));

        let items = roster_items(&session, "");
        match &items[1] {
            RosterItem::User {
                identifier,
                unread,
                active,
                avatar,
                ..
            } => {
                assert_eq!(identifier, "bob");
                assert_eq!(*unread, 1);
                assert!(!active);
                assert_eq!(avatar.icon, "♂");
            }
            other => panic!("unexpected item {other:?}"),
        }
        assert!(matches!(&items[3], RosterItem::User { active: true, .. }));
        assert!(matches!(items[0], RosterItem::Public { active: false, .. }));
    }

    #[test]
    fn view_lists_selected_conversation_in_order() {
        let mut session = session();
        let join = ChatMessage::join("bob", Gender::Male);
        session.record_public(Message::from_wire(join, Content::Empty));
        session.record_public(Message::from_wire(
            ChatMessage::chat("bob", "hello").with_timestamp("10:02"),
            Content::Plain("hello".into()),
        ));
        session.record_public(Message::from_wire(
            ChatMessage::chat("alice", "hi bob"),
            Content::Plain("hi bob".into()),
        ));
        session.record_public(Message::from_wire(ChatMessage::leave("bob"), Content::Empty));

        let view = render(&session, "");
        assert_eq!(view.title, PUBLIC_ROOM_LABEL);
        assert!(!view.encrypted);
        assert_eq!(view.online_label, "3 Online");
        assert_eq!(
            view.messages,
            vec![
                MessageLine::Event {
                    text: "bob joined the secure line.".into()
                },
                MessageLine::Chat {
                    sender: "bob".into(),
                    initial: "b".into(),
                    avatar: avatar_style(Gender::Male),
                    content: "hello".into(),
                    timestamp: Some("10:02".into()),
                    own: false,
                },
                MessageLine::Chat {
                    sender: "alice".into(),
                    initial: "a".into(),
                    avatar: avatar_style(Gender::Female),
                    content: "hi bob".into(),
                    timestamp: None,
                    own: true,
                },
                MessageLine::Event {
                    text: "bob disconnected.".into()
                },
            ]
        );
    }

    #[test]
    fn private_view_and_placeholders() {
        let mut session = session();
        session.select(ConversationKey::private("eve"));
        let wire = ChatMessage::chat("eve", "garbled").with_recipient("alice");
        session.record_private("eve", Message::from_wire(wire, Content::Undecipherable));

        let view = render(&session, "");
        assert_eq!(view.title, "Private: eve");
        assert!(view.encrypted);
        match &view.messages[0] {
            MessageLine::Chat { content, avatar, .. } => {
                assert_eq!(content, UNDECIPHERABLE);
                // eve is not online, so no category is known.
                assert_eq!(*avatar, avatar_style(Gender::Other));
            }
            other => panic!("unexpected line {other:?}"),
        }
    }

    #[test]
    fn view_serializes_with_kind_tags() {
        let json = serde_json::to_value(render(&session(), "")).unwrap();
        assert_eq!(json["roster"][0]["kind"], "public");
        assert_eq!(json["roster"][1]["kind"], "user");
        assert_eq!(json["online_count"], 3);
    }
}
