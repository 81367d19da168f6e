use std::fmt;

/// Destinations a client can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The shared room every online participant sees.
    Public,
    /// Private inbox of one identifier.
    Private(String),
    /// Full roster snapshots.
    Users,
}

const PUBLIC_TOPIC: &str = "/topic/public";
const USERS_TOPIC: &str = "/topic/users";
const PRIVATE_PREFIX: &str = "/topic/private.";

impl Topic {
    pub fn private(identifier: impl Into<String>) -> Self {
        Self::Private(identifier.into())
    }

    /// Destination string as used on the wire.
    pub fn path(&self) -> String {
        match self {
            Self::Public => PUBLIC_TOPIC.to_string(),
            Self::Users => USERS_TOPIC.to_string(),
            Self::Private(id) => format!("{PRIVATE_PREFIX}{id}"),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        match path {
            PUBLIC_TOPIC => Some(Self::Public),
            USERS_TOPIC => Some(Self::Users),
            _ => path
                .strip_prefix(PRIVATE_PREFIX)
                .filter(|id| !id.is_empty())
                .map(Self::private),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Application endpoints a client publishes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Announce presence (JOIN) and register roster attributes.
    AddUser,
    /// Message for the shared room.
    SendMessage,
    /// Message for a single recipient.
    Private,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::AddUser => "/app/chat.addUser",
            Self::SendMessage => "/app/chat.sendMessage",
            Self::Private => "/app/chat.private",
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        [Self::AddUser, Self::SendMessage, Self::Private]
            .into_iter()
            .find(|e| e.path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
