//! Shared message board
//!
//! The only state shared between sessions: connected users, posted
//! messages and the update-pending flag. Every field lives behind one
//! `Mutex`, and every operation takes the lock exactly once, so no two
//! operations interleave their effects. The collections are never handed
//! out by reference; callers get clones.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::AppError;
use crate::message::Message;
use crate::types::ConnectionId;
use crate::user::User;

/// Update flag signalled to polling sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStatus {
    /// User list unchanged since last consumed
    #[default]
    NoUpdate,
    /// User list changed
    UpdatePending,
}

#[derive(Debug, Default)]
struct BoardState {
    /// Connected users in connection order
    users: Vec<User>,
    /// Messages in lock-acquisition order
    messages: Vec<Message>,
    status: UpdateStatus,
}

impl BoardState {
    fn position_of(&self, username: &str) -> Option<usize> {
        self.users.iter().position(|u| u.is_named(username))
    }

    fn usernames(&self) -> Vec<String> {
        self.users.iter().map(|u| u.username.clone()).collect()
    }
}

/// The message board
///
/// Created once at startup and shared as `Arc<Board>`.
#[derive(Debug, Default)]
pub struct Board {
    state: Mutex<BoardState>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation leaves the state consistent before it can panic,
    /// so a poisoned lock is safe to recover.
    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user
    ///
    /// Fails with `DuplicateUser` if the name is already present.
    pub fn add_user(&self, id: ConnectionId, username: &str) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.position_of(username).is_some() {
            return Err(AppError::DuplicateUser(username.to_string()));
        }

        let user = User::new(id, username);
        state.users.push(user.clone());
        state.status = UpdateStatus::UpdatePending;
        debug!("Total users: {}", state.users.len());
        Ok(user)
    }

    /// Remove a user by name; no-op if absent
    pub fn remove_user(&self, username: &str) -> Option<User> {
        let mut state = self.lock();
        let index = state.position_of(username)?;
        let user = state.users.remove(index);
        state.status = UpdateStatus::UpdatePending;
        debug!("Total users: {}", state.users.len());
        Some(user)
    }

    /// Replace `old` with `new` for the same connection
    ///
    /// Fails with `DuplicateUser`, leaving `old` in place, if `new` is
    /// taken. Both changes happen under one lock.
    pub fn rename_user(&self, id: ConnectionId, old: &str, new: &str) -> Result<User, AppError> {
        let mut state = self.lock();
        if state.position_of(new).is_some() {
            return Err(AppError::DuplicateUser(new.to_string()));
        }

        match state.position_of(old) {
            Some(index) => {
                state.users.remove(index);
            }
            None => warn!("Renaming '{}' to '{}' but '{}' was not on the board", old, new, old),
        }
        let user = User::new(id, new);
        state.users.push(user.clone());
        state.status = UpdateStatus::UpdatePending;
        Ok(user)
    }

    /// Look up a user by name
    pub fn get_user(&self, username: &str) -> Option<User> {
        let state = self.lock();
        state
            .position_of(username)
            .map(|index| state.users[index].clone())
    }

    /// Append a message stamped with the current time
    pub fn add_message(&self, username: &str, text: &str) -> Message {
        let mut state = self.lock();
        // Stamped under the lock so timestamps follow board order
        let message = Message::new(username, text);
        state.messages.push(message.clone());
        message
    }

    /// Remove one message; returns whether it was present
    pub fn remove_message(&self, message: &Message) -> bool {
        let mut state = self.lock();
        match state.messages.iter().position(|m| m == message) {
            Some(index) => {
                state.messages.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every message; returns how many were removed
    pub fn clear_messages(&self) -> usize {
        let mut state = self.lock();
        let removed = state.messages.len();
        state.messages.clear();
        removed
    }

    /// Snapshot of all messages in board order
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Usernames in connection order
    pub fn list_usernames(&self) -> Vec<String> {
        self.lock().usernames()
    }

    /// Number of connected users
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Current update flag
    pub fn status(&self) -> UpdateStatus {
        self.lock().status
    }

    /// Flag the user list as changed
    pub fn mark_update_pending(&self) {
        self.lock().status = UpdateStatus::UpdatePending;
    }

    /// Clear the update flag; returns whether it was set
    pub fn consume_update_pending(&self) -> bool {
        let mut state = self.lock();
        std::mem::take(&mut state.status) == UpdateStatus::UpdatePending
    }

    /// Consume the update flag and, if it was set, list the users
    ///
    /// Both happen in one critical section, so each flag-set event is
    /// delivered to at most one poller.
    pub fn take_update(&self) -> Option<Vec<String>> {
        let mut state = self.lock();
        match std::mem::take(&mut state.status) {
            UpdateStatus::UpdatePending => Some(state.usernames()),
            UpdateStatus::NoUpdate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_add_and_get_user() {
        let board = Board::new();
        let user = board.add_user(ConnectionId(1), "alice").unwrap();

        assert_eq!(user.id, ConnectionId(1));
        assert_eq!(board.get_user("alice"), Some(user));
        assert!(board.get_user("bob").is_none());
        assert_eq!(board.user_count(), 1);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let board = Board::new();
        board.add_user(ConnectionId(1), "alice").unwrap();

        let err = board.add_user(ConnectionId(2), "alice").unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser(name) if name == "alice"));
        assert_eq!(board.user_count(), 1);
        assert_eq!(board.get_user("alice").unwrap().id, ConnectionId(1));
    }

    #[test]
    fn test_remove_user() {
        let board = Board::new();
        board.add_user(ConnectionId(1), "alice").unwrap();
        board.add_user(ConnectionId(2), "bob").unwrap();

        assert_eq!(board.remove_user("alice").unwrap().id, ConnectionId(1));
        assert!(board.remove_user("alice").is_none());
        assert_eq!(board.list_usernames(), vec!["bob".to_string()]);

        // Name is free again
        assert!(board.add_user(ConnectionId(3), "alice").is_ok());
    }

    #[test]
    fn test_rename_user() {
        let board = Board::new();
        board.add_user(ConnectionId(1), "alice").unwrap();
        board.add_user(ConnectionId(2), "bob").unwrap();
        board.consume_update_pending();

        let err = board.rename_user(ConnectionId(1), "alice", "bob").unwrap_err();
        assert!(matches!(err, AppError::DuplicateUser(name) if name == "bob"));
        assert_eq!(board.list_usernames(), vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(board.status(), UpdateStatus::NoUpdate);

        let user = board.rename_user(ConnectionId(1), "alice", "carol").unwrap();
        assert_eq!(user.id, ConnectionId(1));
        assert_eq!(board.list_usernames(), vec!["bob".to_string(), "carol".to_string()]);
        assert_eq!(board.status(), UpdateStatus::UpdatePending);

        // Old name already gone: the new one is still added
        board.rename_user(ConnectionId(3), "ghost", "dave").unwrap();
        assert_eq!(board.user_count(), 3);
    }

    #[test]
    fn test_messages_in_append_order() {
        let board = Board::new();
        board.add_message("alice", "first");
        board.add_message("ghost", "second");

        let texts: Vec<_> = board.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_clear_messages_idempotent() {
        let board = Board::new();
        board.add_message("alice", "a");
        board.add_message("alice", "b");

        assert_eq!(board.clear_messages(), 2);
        assert!(board.messages().is_empty());
        assert_eq!(board.clear_messages(), 0);
        assert!(board.messages().is_empty());
    }

    #[test]
    fn test_remove_message() {
        let board = Board::new();
        let first = board.add_message("alice", "a");
        board.add_message("alice", "b");

        assert!(board.remove_message(&first));
        assert!(!board.remove_message(&first));
        assert_eq!(board.messages().len(), 1);
        assert_eq!(board.messages()[0].text, "b");
    }

    #[test]
    fn test_update_flag() {
        let board = Board::new();
        assert_eq!(board.status(), UpdateStatus::NoUpdate);
        assert!(board.take_update().is_none());

        board.add_user(ConnectionId(1), "alice").unwrap();
        board.add_user(ConnectionId(2), "bob").unwrap();
        assert_eq!(board.status(), UpdateStatus::UpdatePending);

        assert_eq!(
            board.take_update(),
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
        assert!(board.take_update().is_none());

        board.mark_update_pending();
        assert!(board.consume_update_pending());
        assert!(!board.consume_update_pending());
    }

    #[test]
    fn test_messages_do_not_touch_update_flag() {
        let board = Board::new();
        board.add_message("alice", "hello");
        board.clear_messages();
        assert_eq!(board.status(), UpdateStatus::NoUpdate);
    }

    #[test]
    fn test_concurrent_connects_keep_names_unique() {
        let board = Arc::new(Board::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let board = Arc::clone(&board);
                thread::spawn(move || board.add_user(ConnectionId(i), "alice").is_ok())
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(board.user_count(), 1);
    }

    #[test]
    fn test_concurrent_posts_are_whole() {
        let board = Arc::new(Board::new());
        let handles: Vec<_> = ["alice", "bob"]
            .into_iter()
            .map(|name| {
                let board = Arc::clone(&board);
                thread::spawn(move || {
                    for i in 0..100 {
                        board.add_message(name, &format!("{} message {}", name, i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let messages = board.messages();
        assert_eq!(messages.len(), 200);
        for name in ["alice", "bob"] {
            // Per-author order is preserved
            let own: Vec<_> = messages
                .iter()
                .filter(|m| m.username == name)
                .map(|m| m.text.clone())
                .collect();
            let expected: Vec<_> = (0..100).map(|i| format!("{} message {}", name, i)).collect();
            assert_eq!(own, expected);
        }
    }
}
