use std::collections::VecDeque;
use std::future::Future;

use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use gochat_broker::{Broker, BrokerConnection};
use gochat_types::{Endpoint, Topic};

use crate::error::TransportError;

/// Something the transport reports back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection requested by [`Transport::connect`] is up.
    Connected,
    /// The connection attempt failed.
    ConnectFailed(String),
    /// A text frame arrived on a subscribed topic.
    Delivery { topic: Topic, body: String },
    /// The connection went away without the client asking.
    Closed,
}

/// Publish/subscribe channel the dispatcher talks through.
///
/// Every call is non-blocking. Outcomes of `connect` and everything the
/// other side sends come back as [`TransportEvent`]s, in order.
pub trait Transport {
    fn connect(&mut self, identifier: &str) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &Topic) -> Result<(), TransportError>;

    /// Fire-and-forget send of a JSON text frame.
    fn send(&mut self, endpoint: Endpoint, body: String) -> Result<(), TransportError>;

    fn disconnect(&mut self);

    /// Next queued event, if one is ready.
    fn try_next_event(&mut self) -> Option<TransportEvent>;

    /// Wait for the next event. `None` once nothing more can arrive.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;
}

/// Transport backed by an in-process [`Broker`].
pub struct BrokerTransport {
    broker: Broker,
    connection: Option<BrokerConnection>,
    pending: VecDeque<TransportEvent>,
}

impl BrokerTransport {
    pub fn new(broker: Broker) -> Self {
        Self {
            broker,
            connection: None,
            pending: VecDeque::new(),
        }
    }

    pub fn connection_id(&self) -> Option<Uuid> {
        self.connection.as_ref().map(|c| c.id)
    }

    fn open(&self) -> Result<&BrokerConnection, TransportError> {
        self.connection.as_ref().ok_or(TransportError::NotConnected)
    }
}

impl Transport for BrokerTransport {
    fn connect(&mut self, identifier: &str) -> Result<(), TransportError> {
        if self.connection.is_some() {
            self.disconnect();
        }

        match self.broker.connect(identifier) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.pending.push_back(TransportEvent::Connected);
            }
            Err(e) => {
                warn!("Broker refused {}: {}", identifier, e);
                self.pending.push_back(TransportEvent::ConnectFailed(e.to_string()));
            }
        }
        Ok(())
    }

    fn subscribe(&mut self, topic: &Topic) -> Result<(), TransportError> {
        let id = self.open()?.id;
        self.broker.subscribe(id, topic.clone())?;
        Ok(())
    }

    fn send(&mut self, endpoint: Endpoint, body: String) -> Result<(), TransportError> {
        let id = self.open()?.id;
        self.broker.publish(id, endpoint, &body)?;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.pending.clear();
        if let Some(connection) = self.connection.take() {
            if let Err(e) = self.broker.disconnect(connection.id) {
                debug!("Broker disconnect of {}: {}", connection.identifier, e);
            }
        }
    }

    fn try_next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let received = self.connection.as_mut()?.frames.try_recv();
        match received {
            Ok(frame) => Some(TransportEvent::Delivery {
                topic: frame.topic,
                body: frame.body,
            }),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.connection = None;
                Some(TransportEvent::Closed)
            }
        }
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let received = self.connection.as_mut()?.frames.recv().await;
        match received {
            Some(frame) => Some(TransportEvent::Delivery {
                topic: frame.topic,
                body: frame.body,
            }),
            None => {
                self.connection = None;
                Some(TransportEvent::Closed)
            }
        }
    }
}
