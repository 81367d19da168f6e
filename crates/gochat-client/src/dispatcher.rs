use serde::de::DeserializeOwned;
use tracing::{debug, info, trace, warn};

use gochat_crypto::{PADDING, decode, encode};
use gochat_types::{ChatMessage, Endpoint, Gender, Topic, UserInfo};

use crate::error::ClientError;
use crate::roster::RosterEntry;
use crate::session::{Arrival, LocalUser, Session};
use crate::store::{Content, ConversationKey, Message};
use crate::transport::{Transport, TransportEvent};

/// Shown on the login screen when the connection attempt fails.
pub const LOGIN_FAILED: &str = "Connection failed. Please retry.";

/// Default display format for outgoing timestamps: two-digit hour and minute.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The last attempt failed; carries the transport's reason.
    Error(String),
}

/// What the output binding has to redraw after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Subscriptions are up and presence was announced.
    Connected,
    /// The connection attempt failed; carries the user-facing message.
    ConnectFailed(String),
    Disconnected,
    /// Append this message to the open conversation.
    Message(Message),
    /// A background private thread has a new unread count.
    Unread { identifier: String, count: u32 },
    /// The roster panel changed (online set and count).
    Roster,
    /// The selected conversation changed; redraw both panels.
    Conversation,
}

/// Connection state machine and event handler for one client.
pub struct Dispatcher<T: Transport> {
    transport: T,
    state: ConnectionState,
    session: Option<Session>,
    time_format: String,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            session: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start connecting as `identifier`.
    ///
    /// Reconnecting under the same identifier keeps the conversation history;
    /// a different identifier starts a fresh session.
    pub fn connect(&mut self, identifier: &str, gender: Option<Gender>) -> Result<(), ClientError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ClientError::EmptyIdentifier);
        }
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            return Err(ClientError::AlreadyConnected);
        }

        let gender = gender.unwrap_or_default();
        match self.session.as_mut() {
            Some(session) if session.local().identifier == identifier => session.set_gender(gender),
            _ => self.session = Some(Session::new(identifier, gender)),
        }

        info!("{} connecting", identifier);
        self.state = ConnectionState::Connecting;
        if let Err(e) = self.transport.connect(identifier) {
            warn!("{} could not start connecting: {}", identifier, e);
            self.state = ConnectionState::Error(e.to_string());
            return Err(ClientError::ConnectionFailure(e.to_string()));
        }
        Ok(())
    }

    /// Leave the channel. History is kept; the roster is cleared.
    pub fn disconnect(&mut self) -> Option<Update> {
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            return None;
        }

        self.transport.disconnect();
        self.went_offline();
        Some(Update::Disconnected)
    }

    /// Open a conversation.
    pub fn select(&mut self, key: ConversationKey) -> Result<Update, ClientError> {
        let session = self.session.as_mut().ok_or(ClientError::NoSession)?;
        if key.identifier() == Some(session.local().identifier.as_str()) {
            return Err(ClientError::SelfConversation);
        }

        trace!("{} selected {}", session.local().identifier, key);
        session.select(key);
        Ok(Update::Conversation)
    }

    /// Send `text` to the selected conversation.
    ///
    /// Private messages leave encoded and are stored in plaintext; room
    /// messages are stored when the room echoes them back.
    pub fn send(&mut self, text: &str) -> Result<Option<Update>, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.state != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }
        let session = self.session.as_mut().ok_or(ClientError::NotConnected)?;

        let local = session.local().identifier.clone();
        let timestamp = chrono::Local::now().format(&self.time_format).to_string();

        match session.selected().clone() {
            ConversationKey::Public => {
                let wire = ChatMessage::chat(local, text).with_timestamp(timestamp);
                self.transport
                    .send(Endpoint::SendMessage, serde_json::to_string(&wire)?)?;
                Ok(None)
            }

            ConversationKey::Private(partner) => {
                if text.ends_with(PADDING) {
                    debug!(
                        "Trailing '{}' will not survive decoding on {}'s side",
                        PADDING, partner
                    );
                }
                let cipher = encode(text, &session.key_with(&partner))?;
                let wire = ChatMessage::chat(local, cipher)
                    .with_recipient(partner.clone())
                    .with_timestamp(timestamp);
                self.transport
                    .send(Endpoint::Private, serde_json::to_string(&wire)?)?;

                let local_copy = Message::from_wire(wire, Content::Plain(text.to_string()));
                session.record_outgoing(&partner, local_copy.clone());
                Ok(Some(Update::Message(local_copy)))
            }
        }
    }

    /// Apply one transport event. Never fails: bad input is logged and dropped.
    pub fn handle(&mut self, event: TransportEvent) -> Option<Update> {
        match event {
            TransportEvent::Connected if self.state == ConnectionState::Connecting => {
                self.on_connected()
            }

            TransportEvent::ConnectFailed(reason) if self.state == ConnectionState::Connecting => {
                warn!("Connection failed: {}", reason);
                self.state = ConnectionState::Error(reason);
                Some(Update::ConnectFailed(LOGIN_FAILED.to_string()))
            }

            TransportEvent::Delivery { topic, body }
                if self.state == ConnectionState::Connected =>
            {
                match self.on_delivery(&topic, &body) {
                    Ok(update) => update,
                    Err(e) => {
                        warn!("Dropping frame on {}: {} -- raw: {}", topic, e, preview(&body));
                        None
                    }
                }
            }

            TransportEvent::Closed
                if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) =>
            {
                info!("Connection closed by transport");
                self.went_offline();
                Some(Update::Disconnected)
            }

            other => {
                debug!("Ignoring {:?} while {:?}", other, self.state);
                None
            }
        }
    }

    fn went_offline(&mut self) {
        self.state = ConnectionState::Disconnected;
        if let Some(session) = self.session.as_mut() {
            session.clear_roster();
        }
    }

    fn on_connected(&mut self) -> Option<Update> {
        let Some(session) = self.session.as_ref() else {
            warn!("Connected without a session");
            self.transport.disconnect();
            self.state = ConnectionState::Disconnected;
            return None;
        };
        let local = session.local().clone();

        let result = self.join_channel(&local);

        match result {
            Ok(()) => {
                info!("{} connected", local.identifier);
                self.state = ConnectionState::Connected;
                Some(Update::Connected)
            }
            Err(e) => {
                warn!("{} could not join: {}", local.identifier, e);
                self.transport.disconnect();
                self.state = ConnectionState::Error(e.to_string());
                Some(Update::ConnectFailed(LOGIN_FAILED.to_string()))
            }
        }
    }

    /// Subscribe to the room, the local inbox and roster broadcasts, then
    /// announce presence.
    fn join_channel(&mut self, local: &LocalUser) -> Result<(), ClientError> {
        for topic in [Topic::Public, Topic::private(local.identifier.clone()), Topic::Users] {
            self.transport.subscribe(&topic)?;
        }
        let join = ChatMessage::join(local.identifier.clone(), local.gender);
        self.transport.send(Endpoint::AddUser, serde_json::to_string(&join)?)?;
        Ok(())
    }

    fn on_delivery(&mut self, topic: &Topic, body: &str) -> Result<Option<Update>, ClientError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        match topic {
            Topic::Public => {
                let wire: ChatMessage = parse(topic, body)?;
                if wire.sender.is_empty() {
                    return Err(ClientError::EmptySender { topic: topic.path() });
                }
                let content = wire.content.clone().map_or(Content::Empty, Content::Plain);
                let message = Message::from_wire(wire, content);

                match session.record_public(message.clone()) {
                    Arrival::Visible => Ok(Some(Update::Message(message))),
                    Arrival::Background(_) => Ok(None),
                }
            }

            Topic::Private(owner) => {
                if *owner != session.local().identifier {
                    debug!("Frame for {}'s inbox reached {}", owner, session.local().identifier);
                    return Ok(None);
                }

                let wire: ChatMessage = parse(topic, body)?;
                if wire.sender.is_empty() {
                    return Err(ClientError::EmptySender { topic: topic.path() });
                }
                let partner = wire.sender.clone();
                let content = match wire.content.as_deref() {
                    None => Content::Empty,
                    Some(cipher) => match decode(cipher, &session.key_with(&partner)) {
                        Ok(plain) => Content::Plain(plain),
                        Err(e) => {
                            let e = ClientError::from(e);
                            warn!("Undecipherable message from {}: {}", partner, e);
                            Content::Undecipherable
                        }
                    },
                };
                let message = Message::from_wire(wire, content);

                match session.record_private(&partner, message.clone()) {
                    Arrival::Visible => Ok(Some(Update::Message(message))),
                    Arrival::Background(count) => Ok(Some(Update::Unread {
                        identifier: partner,
                        count: count.unwrap_or(0),
                    })),
                }
            }

            Topic::Users => {
                let users: Vec<UserInfo> = parse(topic, body)?;
                session.replace_roster(users.into_iter().map(RosterEntry::from));
                debug!("Roster now has {} entries", session.roster().len());
                Ok(Some(Update::Roster))
            }
        }
    }
}

fn parse<D: DeserializeOwned>(topic: &Topic, body: &str) -> Result<D, ClientError> {
    serde_json::from_str(body).map_err(|source| ClientError::MalformedPayload {
        topic: topic.path(),
        source,
    })
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
