use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use gochat_types::{ChatMessage, Endpoint, Topic, UserInfo};

use crate::BrokerError;

/// A text frame delivered to a subscribed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub topic: Topic,
    pub body: String,
}

/// Client side of a broker connection.
pub struct BrokerConnection {
    pub id: Uuid,
    pub identifier: String,
    /// Every frame for every topic this connection subscribed to, in
    /// delivery order.
    pub frames: mpsc::UnboundedReceiver<Frame>,
}

/// Relays frames between connected clients and tracks who is online.
#[derive(Clone, Default)]
pub struct Broker {
    inner: Arc<Mutex<BrokerState>>,
}

#[derive(Default)]
struct BrokerState {
    connections: HashMap<Uuid, ConnectionEntry>,

    /// identifier -> owning connection
    owners: HashMap<String, Uuid>,

    /// Announced users in announcement order
    roster: Vec<UserInfo>,
}

struct ConnectionEntry {
    identifier: String,
    topics: HashSet<Topic>,
    tx: mpsc::UnboundedSender<Frame>,
    /// Set once the client announced itself through `/app/chat.addUser`.
    announced: bool,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, BrokerState>, BrokerError> {
        self.inner.lock().map_err(|_| BrokerError::Poisoned)
    }

    /// Open a connection for `identifier`. Identifiers are unique among
    /// live connections.
    pub fn connect(&self, identifier: &str) -> Result<BrokerConnection, BrokerError> {
        if identifier.is_empty() {
            return Err(BrokerError::EmptyIdentifier);
        }

        let mut state = self.state()?;
        if state.owners.contains_key(identifier) {
            warn!("Rejecting connection: {} is already online", identifier);
            return Err(BrokerError::IdentifierTaken(identifier.to_string()));
        }

        let id = Uuid::new_v4();
        let (tx, frames) = mpsc::unbounded_channel();
        state.owners.insert(identifier.to_string(), id);
        state.connections.insert(
            id,
            ConnectionEntry {
                identifier: identifier.to_string(),
                topics: HashSet::new(),
                tx,
                announced: false,
            },
        );

        info!("{} connected ({})", identifier, id);
        Ok(BrokerConnection {
            id,
            identifier: identifier.to_string(),
            frames,
        })
    }

    pub fn subscribe(&self, conn_id: Uuid, topic: Topic) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        let entry = state
            .connections
            .get_mut(&conn_id)
            .ok_or(BrokerError::UnknownConnection(conn_id))?;

        if let Topic::Private(owner) = &topic {
            if *owner != entry.identifier {
                warn!("{} tried to subscribe to {}", entry.identifier, topic);
                return Err(BrokerError::ForeignInbox(owner.clone()));
            }
        }

        debug!("{} subscribed to {}", entry.identifier, topic);
        entry.topics.insert(topic);
        Ok(())
    }

    /// Handle a frame sent by a client to one of the application endpoints.
    pub fn publish(
        &self,
        conn_id: Uuid,
        endpoint: Endpoint,
        body: &str,
    ) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        let identifier = state
            .connections
            .get(&conn_id)
            .map(|entry| entry.identifier.clone())
            .ok_or(BrokerError::UnknownConnection(conn_id))?;

        let message: ChatMessage = serde_json::from_str(body).map_err(|e| {
            warn!(
                "{} bad frame on {}: {} -- raw: {}",
                identifier,
                endpoint,
                e,
                body.chars().take(200).collect::<String>()
            );
            BrokerError::Malformed(e)
        })?;

        if message.sender != identifier {
            warn!("{} sent a frame claiming to be {}", identifier, message.sender);
            return Err(BrokerError::SenderMismatch {
                claimed: message.sender,
                actual: identifier,
            });
        }

        match endpoint {
            Endpoint::AddUser => {
                state.announce(
                    conn_id,
                    UserInfo {
                        username: identifier.clone(),
                        gender: message.gender,
                        public_key: message.public_key.clone(),
                    },
                );
                state.broadcast_roster()?;
                state.deliver(&Topic::Public, serde_json::to_string(&message)?);
                info!("{} joined ({} online)", identifier, state.roster.len());
            }

            Endpoint::SendMessage => {
                trace!("{} -> public", identifier);
                state.deliver(&Topic::Public, serde_json::to_string(&message)?);
            }

            Endpoint::Private => {
                let recipient = message
                    .recipient
                    .clone()
                    .ok_or(BrokerError::MissingRecipient)?;
                trace!("{} -> private {}", identifier, recipient);
                state.deliver(&Topic::private(recipient), serde_json::to_string(&message)?);
            }
        }

        Ok(())
    }

    /// Close a connection. Announced users are removed from the roster and
    /// their departure is relayed to the room.
    pub fn disconnect(&self, conn_id: Uuid) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        let entry = state
            .connections
            .remove(&conn_id)
            .ok_or(BrokerError::UnknownConnection(conn_id))?;

        // Only release the identifier if this connection still owns it.
        if state.owners.get(&entry.identifier) == Some(&conn_id) {
            state.owners.remove(&entry.identifier);
        }

        if entry.announced {
            state.roster.retain(|u| u.username != entry.identifier);
            state.deliver(
                &Topic::Public,
                serde_json::to_string(&ChatMessage::leave(entry.identifier.clone()))?,
            );
            state.broadcast_roster()?;
        }

        info!("{} disconnected ({})", entry.identifier, conn_id);
        Ok(())
    }

    /// Current roster in announcement order.
    pub fn online_users(&self) -> Result<Vec<UserInfo>, BrokerError> {
        Ok(self.state()?.roster.clone())
    }
}

impl BrokerState {
    fn announce(&mut self, conn_id: Uuid, user: UserInfo) {
        if let Some(entry) = self.connections.get_mut(&conn_id) {
            entry.announced = true;
        }
        match self.roster.iter_mut().find(|u| u.username == user.username) {
            Some(existing) => *existing = user,
            None => self.roster.push(user),
        }
    }

    fn broadcast_roster(&self) -> Result<(), BrokerError> {
        let body = serde_json::to_string(&self.roster)?;
        self.deliver(&Topic::Users, body);
        Ok(())
    }

    fn deliver(&self, topic: &Topic, body: String) {
        for entry in self.connections.values() {
            if !entry.topics.contains(topic) {
                continue;
            }
            let frame = Frame {
                topic: topic.clone(),
                body: body.clone(),
            };
            if entry.tx.send(frame).is_err() {
                trace!("{} dropped its frame receiver", entry.identifier);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gochat_types::{Gender, MessageType};

    use super::*;

    fn join(broker: &Broker, name: &str, gender: Gender) -> BrokerConnection {
        let conn = broker.connect(name).unwrap();
        for topic in [Topic::Public, Topic::private(name), Topic::Users] {
            broker.subscribe(conn.id, topic).unwrap();
        }
        let body = serde_json::to_string(&ChatMessage::join(name, gender)).unwrap();
        broker.publish(conn.id, Endpoint::AddUser, &body).unwrap();
        conn
    }

    fn drain(conn: &mut BrokerConnection) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = conn.frames.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn identifiers_are_unique_while_online() {
        let broker = Broker::new();
        let alice = broker.connect("alice").unwrap();
        assert!(matches!(broker.connect("alice"), Err(BrokerError::IdentifierTaken(_))));
        assert!(matches!(broker.connect(""), Err(BrokerError::EmptyIdentifier)));

        broker.disconnect(alice.id).unwrap();
        assert!(broker.connect("alice").is_ok());
    }

    #[test]
    fn add_user_broadcasts_roster_then_join() {
        let broker = Broker::new();
        let mut alice = join(&broker, "alice", Gender::Female);

        let frames = drain(&mut alice);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].topic, Topic::Users);
        let roster: Vec<UserInfo> = serde_json::from_str(&frames[0].body).unwrap();
        let expected = UserInfo {
            username: "alice".into(),
            gender: Some(Gender::Female),
            public_key: Some("N/A".into()),
        };
        assert_eq!(roster, vec![expected.clone()]);
        assert_eq!(broker.online_users().unwrap(), vec![expected]);

        assert_eq!(frames[1].topic, Topic::Public);
        let msg: ChatMessage = serde_json::from_str(&frames[1].body).unwrap();
        assert_eq!(msg.kind, MessageType::Join);
    }

    #[test]
    fn private_frames_reach_only_the_recipient() {
        let broker = Broker::new();
        let mut alice = join(&broker, "alice", Gender::Female);
        let mut bob = join(&broker, "bob", Gender::Male);
        let mut carol = join(&broker, "carol", Gender::Other);
        drain(&mut alice);
        drain(&mut bob);
        drain(&mut carol);

        let private = ChatMessage::chat("alice", "xyz").with_recipient("bob");
        let body = serde_json::to_string(&private).unwrap();
        broker.publish(alice.id, Endpoint::Private, &body).unwrap();

        assert!(drain(&mut alice).is_empty());
        assert!(drain(&mut carol).is_empty());
        let frames = drain(&mut bob);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].topic, Topic::private("bob"));
    }

    #[test]
    fn disconnect_relays_leave_and_new_roster() {
        let broker = Broker::new();
        let mut alice = join(&broker, "alice", Gender::Female);
        let bob = join(&broker, "bob", Gender::Male);
        drain(&mut alice);
        let online: Vec<String> = broker
            .online_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(online, ["alice", "bob"]);

        broker.disconnect(bob.id).unwrap();

        let frames = drain(&mut alice);
        assert_eq!(frames.len(), 2);
        let leave: ChatMessage = serde_json::from_str(&frames[0].body).unwrap();
        assert_eq!(leave, ChatMessage::leave("bob"));
        let roster: Vec<UserInfo> = serde_json::from_str(&frames[1].body).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].username, "alice");
        assert!(matches!(broker.disconnect(bob.id), Err(BrokerError::UnknownConnection(_))));
        assert_eq!(broker.online_users().unwrap().len(), 1);
    }

    #[test]
    fn silent_disconnect_before_announcing() {
        let broker = Broker::new();
        let mut alice = join(&broker, "alice", Gender::Female);
        drain(&mut alice);

        let lurker = broker.connect("lurker").unwrap();
        assert_eq!(broker.online_users().unwrap().len(), 1);
        broker.disconnect(lurker.id).unwrap();
        assert!(drain(&mut alice).is_empty());
    }

    #[test]
    fn rejects_bad_frames() {
        let broker = Broker::new();
        let alice = join(&broker, "alice", Gender::Female);

        assert!(matches!(
            broker.publish(alice.id, Endpoint::SendMessage, "{not json"),
            Err(BrokerError::Malformed(_))
        ));

        let spoofed = serde_json::to_string(&ChatMessage::chat("bob", "hi")).unwrap();
        assert!(matches!(
            broker.publish(alice.id, Endpoint::SendMessage, &spoofed),
            Err(BrokerError::SenderMismatch { .. })
        ));

        let no_recipient = serde_json::to_string(&ChatMessage::chat("alice", "hi")).unwrap();
        assert!(matches!(
            broker.publish(alice.id, Endpoint::Private, &no_recipient),
            Err(BrokerError::MissingRecipient)
        ));

        assert!(matches!(
            broker.subscribe(alice.id, Topic::private("bob")),
            Err(BrokerError::ForeignInbox(_))
        ));
    }

    #[test]
    fn inbound_and_outbound_json_errors_stay_apart() {
        let broker = Broker::new();
        let alice = join(&broker, "alice", Gender::Female);
        let err = broker
            .publish(alice.id, Endpoint::SendMessage, "[]")
            .unwrap_err();
        assert!(matches!(err, BrokerError::Malformed(_)));
        assert!(err.to_string().starts_with("Malformed frame"));

        // A `?` on serialization lands in Encode, never in Malformed.
        let json_err = serde_json::from_str::<ChatMessage>("x").unwrap_err();
        let err = BrokerError::from(json_err);
        assert!(matches!(err, BrokerError::Encode(_)));
        assert!(err.to_string().starts_with("Could not encode frame"));
    }
}
