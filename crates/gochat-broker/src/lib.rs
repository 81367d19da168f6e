//! In-process relay for the GoChat channel.
//!
//! Plays the server's part of the protocol: it owns the online roster,
//! relays room and private messages, and announces departures. Clients
//! reach it through a connection id handed out by [`Broker::connect`].

pub mod relay;

pub use relay::{Broker, BrokerConnection, Frame};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Identifier {0} is already online")]
    IdentifierTaken(String),

    #[error("Unknown connection {0}")]
    UnknownConnection(Uuid),

    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Could not encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Sender {claimed} does not match connection identifier {actual}")]
    SenderMismatch { claimed: String, actual: String },

    #[error("Cannot subscribe to another participant's inbox {0}")]
    ForeignInbox(String),

    #[error("Private message without recipient")]
    MissingRecipient,

    #[error("Broker state lock poisoned")]
    Poisoned,
}
