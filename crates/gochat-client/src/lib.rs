//! Client core for GoChat.
//!
//! Everything here runs on one logical thread: the [`Client`] owns the
//! [`Dispatcher`], which owns the [`Session`] (history, roster, unread
//! badges). Transport events are applied strictly in arrival order and the
//! renderer only ever reads the session.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod render;
pub mod roster;
pub mod session;
pub mod store;
pub mod transport;

pub use client::Client;
pub use dispatcher::{ConnectionState, Dispatcher, Update};
pub use error::{ClientError, TransportError};
pub use render::{MessageLine, RosterItem, View, render};
pub use roster::{Roster, RosterEntry};
pub use session::{Arrival, LocalUser, Session};
pub use store::{Content, ConversationKey, ConversationStore, Message};
pub use transport::{BrokerTransport, Transport, TransportEvent};
