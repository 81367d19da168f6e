//! Wire types shared by the GoChat broker and client.
//!
//! Payloads travel as UTF-8 JSON text frames. Field names follow the
//! camelCase layout the browser client and the relay have always used.

pub mod events;
pub mod models;

pub use events::{Endpoint, Topic};
pub use models::{ChatMessage, Gender, MessageType, UserInfo};
