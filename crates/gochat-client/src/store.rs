use std::collections::HashMap;
use std::fmt;

use gochat_types::{ChatMessage, MessageType};

/// Which conversation a message belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationKey {
    /// The shared room.
    Public,
    /// Private thread with the named participant.
    Private(String),
}

impl ConversationKey {
    pub fn private(identifier: impl Into<String>) -> Self {
        Self::Private(identifier.into())
    }

    /// Partner identifier for private conversations.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Public => None,
            Self::Private(id) => Some(id),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private(id) => f.write_str(id),
        }
    }
}

/// Stored message body. Always plaintext; ciphertext never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// JOIN/LEAVE events carry no body.
    Empty,
    Plain(String),
    /// A private message whose ciphertext could not be decoded.
    Undecipherable,
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text),
            _ => None,
        }
    }
}

/// A message record as kept in the conversation store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub kind: MessageType,
    pub content: Content,
    pub recipient: Option<String>,
    pub timestamp: Option<String>,
}

impl Message {
    /// Build a record from a wire message whose content has already been
    /// resolved to plaintext (or a placeholder).
    pub fn from_wire(wire: ChatMessage, content: Content) -> Self {
        Self {
            sender: wire.sender,
            kind: wire.kind,
            content,
            recipient: wire.recipient,
            timestamp: wire.timestamp,
        }
    }
}

/// Append-only history per conversation.
#[derive(Debug, Default)]
pub struct ConversationStore {
    threads: HashMap<ConversationKey, Vec<Message>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: ConversationKey, message: Message) {
        self.threads.entry(key).or_default().push(message);
    }

    /// Full history for `key` in append order; empty if nothing was stored.
    pub fn messages_for(&self, key: &ConversationKey) -> &[Message] {
        self.threads.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self, key: &ConversationKey) -> usize {
        self.messages_for(key).len()
    }
}
