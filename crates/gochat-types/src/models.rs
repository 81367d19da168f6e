use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a chat payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Chat,
    Join,
    Leave,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => f.write_str("CHAT"),
            Self::Join => f.write_str("JOIN"),
            Self::Leave => f.write_str("LEAVE"),
        }
    }
}

/// Presentation category chosen at login. Only used for avatar styling.
///
/// Any value the client does not recognise is treated as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

impl Gender {
    /// Lenient parse used for user input; unknown values become `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MALE" => Self::Male,
            "FEMALE" => Self::Female,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("MALE"),
            Self::Female => f.write_str("FEMALE"),
            Self::Other => f.write_str("OTHER"),
        }
    }
}

/// A message as it travels over the channel.
///
/// For private messages `content` holds ciphertext while in transit; it is
/// decoded by the receiving client before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    fn new(sender: impl Into<String>, kind: MessageType) -> Self {
        Self {
            sender: sender.into(),
            kind,
            content: None,
            recipient: None,
            gender: None,
            public_key: None,
            timestamp: None,
        }
    }

    pub fn chat(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(sender, MessageType::Chat)
        }
    }

    /// Presence announcement. The public key slot has never carried a real key.
    pub fn join(sender: impl Into<String>, gender: Gender) -> Self {
        Self {
            gender: Some(gender),
            public_key: Some("N/A".to_string()),
            ..Self::new(sender, MessageType::Join)
        }
    }

    pub fn leave(sender: impl Into<String>) -> Self {
        Self::new(sender, MessageType::Leave)
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Private messages are the ones addressed to a single recipient.
    pub fn is_private(&self) -> bool {
        self.recipient.is_some()
    }
}

/// One entry of a roster broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub public_key: Option<String>,
}

impl UserInfo {
    pub fn new(username: impl Into<String>, gender: Gender) -> Self {
        Self {
            username: username.into(),
            gender: Some(gender),
            public_key: None,
        }
    }
}
