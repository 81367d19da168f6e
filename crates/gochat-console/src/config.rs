//! Console configuration loaded from environment variables.
//!
//! Every setting has a default, so the binary starts with no configuration.

use gochat_client::dispatcher::DEFAULT_TIME_FORMAT;
use gochat_types::Gender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// chrono format for outgoing timestamps.
    /// Env: `GOCHAT_TIME_FORMAT`
    /// Default: `%H:%M`
    pub time_format: String,

    /// Log in as this participant on startup.
    /// Env: `GOCHAT_USERNAME`
    pub username: Option<String>,

    /// Category for the startup login.
    /// Env: `GOCHAT_GENDER` (MALE/FEMALE/OTHER)
    pub gender: Option<Gender>,

    /// Messages printed when a conversation is redrawn (0 = all).
    /// Env: `GOCHAT_HISTORY_LIMIT`
    /// Default: `0`
    pub history_limit: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            username: None,
            gender: None,
            history_limit: 0,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(format) = var("GOCHAT_TIME_FORMAT") {
            if !format.trim().is_empty() {
                config.time_format = format;
            }
        }

        if let Some(name) = var("GOCHAT_USERNAME") {
            let name = name.trim();
            if !name.is_empty() {
                config.username = Some(name.to_string());
            }
        }

        if let Some(raw) = var("GOCHAT_GENDER") {
            config.gender = Some(Gender::parse(&raw));
        }

        if let Some(val) = var("GOCHAT_HISTORY_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) => config.history_limit = n,
                Err(e) => tracing::warn!(
                    value = %val,
                    error = %e,
                    "Invalid GOCHAT_HISTORY_LIMIT, using default"
                ),
            }
        }

        config
    }
}
