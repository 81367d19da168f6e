use gochat_broker::BrokerError;
use gochat_crypto::CipherError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    #[error("Malformed payload on {topic}: {source}")]
    MalformedPayload {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Payload on {topic} has an empty sender")]
    EmptySender { topic: String },

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected or connecting")]
    AlreadyConnected,

    #[error("Cannot open a private conversation with yourself")]
    SelfConversation,

    #[error("No session; connect first")]
    NoSession,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
}
