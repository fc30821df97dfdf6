//! User struct definition
//!
//! Represents a connected user as recorded on the board.

use crate::types::ConnectionId;

/// Connected user information
///
/// Created on a successful CONNECT and removed on DISCONNECT or when
/// the owning connection ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Connection that registered this user
    pub id: ConnectionId,
    /// Username, unique across the board
    pub username: String,
}

impl User {
    /// Create a new user for the given connection
    pub fn new(id: ConnectionId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// Check whether this user carries the given name
    pub fn is_named(&self, username: &str) -> bool {
        self.username == username
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.id.0, self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new(ConnectionId(3), "alice");

        assert_eq!(user.id, ConnectionId(3));
        assert!(user.is_named("alice"));
        assert!(!user.is_named("Alice"));
        assert_eq!(user.to_string(), "3 alice");
    }
}
