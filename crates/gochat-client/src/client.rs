use gochat_types::Gender;

use crate::dispatcher::{ConnectionState, Dispatcher, Update};
use crate::error::ClientError;
use crate::render::{View, render};
use crate::session::Session;
use crate::store::ConversationKey;
use crate::transport::Transport;

/// A dispatcher plus the roster search text, i.e. everything one output
/// binding drives.
pub struct Client<T: Transport> {
    dispatcher: Dispatcher<T>,
    filter: String,
}

impl<T: Transport> Client<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self {
            dispatcher,
            filter: String::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<T> {
        &mut self.dispatcher
    }

    pub fn state(&self) -> &ConnectionState {
        self.dispatcher.state()
    }

    pub fn session(&self) -> Option<&Session> {
        self.dispatcher.session()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Current view, or `None` before the first login.
    pub fn view(&self) -> Option<View> {
        self.dispatcher.session().map(|s| render(s, &self.filter))
    }

    pub fn connect(&mut self, identifier: &str, gender: Option<Gender>) -> Result<(), ClientError> {
        self.dispatcher.connect(identifier, gender)
    }

    pub fn disconnect(&mut self) -> Option<Update> {
        self.dispatcher.disconnect()
    }

    pub fn select(&mut self, key: ConversationKey) -> Result<Update, ClientError> {
        self.dispatcher.select(key)
    }

    pub fn send(&mut self, text: &str) -> Result<Option<Update>, ClientError> {
        self.dispatcher.send(text)
    }

    /// Apply every event the transport already has queued.
    pub fn pump(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Some(event) = self.dispatcher.transport_mut().try_next_event() {
            updates.extend(self.dispatcher.handle(event));
        }
        updates
    }

    /// Wait for the next event that produces an update.
    ///
    /// Returns `None` once the transport has nothing more to deliver.
    pub async fn next_update(&mut self) -> Option<Update> {
        loop {
            let event = self.dispatcher.transport_mut().next_event().await?;
            if let Some(update) = self.dispatcher.handle(event) {
                return Some(update);
            }
        }
    }
}
