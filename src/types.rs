//! Basic type definitions for the message board server
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: per-connection identifier handed out by the acceptor

/// Unique connection identifier (newtype pattern)
///
/// Assigned by the acceptor from a plain counter that only the accept
/// loop touches, so it needs no synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Return this id and advance the counter to the next one
    pub fn fetch_next(&mut self) -> Self {
        let current = *self;
        self.0 = self.0.wrapping_add(1);
        current
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_monotonic() {
        let mut counter = ConnectionId::default();
        let first = counter.fetch_next();
        let second = counter.fetch_next();
        assert_eq!(first, ConnectionId(0));
        assert_eq!(second, ConnectionId(1));
        assert!(second > first);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "#7");
    }
}
