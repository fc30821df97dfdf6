//! Board message definition
//!
//! A message is immutable once posted; the board only appends, clears,
//! or removes whole messages.

use chrono::{DateTime, Local};

/// Clock format used when a message is rendered on the wire
pub const MESSAGE_TIME_FORMAT: &str = "%I:%M";

/// A posted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Creation time
    pub timestamp: DateTime<Local>,
    /// Author; may no longer be connected
    pub username: String,
    /// Message body
    pub text: String,
}

impl Message {
    /// Create a message stamped with the current local time
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_timestamp(Local::now(), username, text)
    }

    /// Create a message with an explicit timestamp
    pub fn with_timestamp(
        timestamp: DateTime<Local>,
        username: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            username: username.into(),
            text: text.into(),
        }
    }
}

/// Renders as `<hh:mm> <username> <text>`
impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format(MESSAGE_TIME_FORMAT),
            self.username,
            self.text
        )
    }
}
