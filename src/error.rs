//! Error types for the message board server
//!
//! Defines application-level errors, request decode errors and startup
//! configuration errors. Uses thiserror for ergonomic error definitions.

use std::time::Duration;

use thiserror::Error;

/// Application-level errors
///
/// Covers both connection-scoped errors (the session ends) and
/// request-scoped errors (an error line is sent to the client).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the connection, or for the listener at bind time)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No request arrived within the idle timeout (fatal)
    #[error("connection idle for more than {0:?}")]
    IdleTimeout(Duration),

    /// Username is already bound to another connection
    #[error("username '{0}' is already connected")]
    DuplicateUser(String),
}

/// Request line decode errors
///
/// A line that fails to decode is discarded but still logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Blank line
    #[error("empty request")]
    Empty,

    /// Leading token is not an integer
    #[error("invalid command '{0}'")]
    InvalidCommand(String),

    /// Integer is not a command a client may send
    #[error("unsupported command code {0}")]
    UnsupportedCommand(i64),

    /// Command requires a username and none was given
    #[error("missing username")]
    MissingUsername,
}

/// Framing problems with a single request line
///
/// The line is logged and discarded; the connection stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// Line exceeds the maximum length
    #[error("line longer than {0} bytes")]
    TooLong(usize),
}

/// Startup configuration errors
///
/// Both are fatal: the binary prints the message and exits non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No port argument
    #[error("ERROR: NO PORT SPECIFIED.")]
    MissingPort,

    /// Port argument is not an integer in 0..=65535
    #[error("ERROR: INVALID PORT SPECIFIED.")]
    InvalidPort(String),
}
