//! Concurrent Message Board Server Library
//!
//! A line-protocol message board: clients connect over TCP, register a
//! username, post and clear messages on a shared board, and disconnect.
//!
//! # Features
//! - Integer-coded line protocol (poll, connect, disconnect, clear, post)
//! - Unique usernames with an explicit error response for duplicates
//! - User cleanup on DISCONNECT, EOF, transport errors and idle timeout
//! - Membership-change polling through an update flag
//! - Append-only, timestamped request log
//!
//! # Architecture
//! One tokio task per connection, all sharing a single `Board`:
//! - `Board` keeps users, messages and the update flag behind one `Mutex`
//! - Each connection runs `handle_connection`, a `Session` state machine
//! - Every raw request line is appended to the `RequestLog`
//!
//! # Example
//! ```ignore
//! use message_board::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::bind(&ServerConfig::new(8080)).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod board;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod request_log;
pub mod server;
pub mod session;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use board::{Board, UpdateStatus};
pub use codec::{RequestFrame, RequestLineCodec};
pub use config::ServerConfig;
pub use error::{AppError, ConfigError, DecodeError, FrameError};
pub use message::Message;
pub use protocol::{Command, Request, Response};
pub use request_log::RequestLog;
pub use server::{run, Server};
pub use session::{handle_connection, Session, SessionContext, SessionState};
pub use types::ConnectionId;
pub use user::User;
