//! Line protocol definitions
//!
//! One request or response per line, fields separated by single spaces.
//! Requests are `<code> [<username> [<text>]]`; the integer code selects
//! the command.

use crate::error::{AppError, DecodeError};
use crate::message::Message;

/// Command codes shared by requests and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Poll for membership changes
    Null = 0,
    /// Register a username
    Connect = 1,
    /// Release the username and close the connection
    Disconnect = 2,
    /// Remove every message from the board
    Clear = 3,
    /// Post a message
    Post = 4,
    /// Server → client user list
    Update = 5,
    /// Server → client error line
    Error = 6,
}

impl Command {
    /// Integer code as it appears on the wire
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Map a wire code to a command a client may send
    ///
    /// `Update` and `Error` are server-only and are rejected here.
    pub fn from_request_code(code: i64) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(Command::Null),
            1 => Ok(Command::Connect),
            2 => Ok(Command::Disconnect),
            3 => Ok(Command::Clear),
            4 => Ok(Command::Post),
            other => Err(DecodeError::UnsupportedCommand(other)),
        }
    }
}

/// Client → Server request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Poll; the username is optional
    Null { username: Option<String> },
    /// Register `username`
    Connect { username: String },
    /// Leave the board
    Disconnect { username: String },
    /// Clear all messages
    Clear { username: String },
    /// Post `text` (the rest of the line, verbatim)
    Post { username: String, text: String },
}

impl Request {
    /// Decode a single request line (without its newline)
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut fields = line.splitn(3, ' ');
        let head = fields.next().unwrap_or_default();
        let code: i64 = head
            .parse()
            .map_err(|_| DecodeError::InvalidCommand(head.to_string()))?;
        let command = Command::from_request_code(code)?;

        let username = fields
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let required = |username: Option<String>| username.ok_or(DecodeError::MissingUsername);

        match command {
            Command::Null => Ok(Request::Null { username }),
            Command::Connect => Ok(Request::Connect {
                username: required(username)?,
            }),
            Command::Disconnect => Ok(Request::Disconnect {
                username: required(username)?,
            }),
            Command::Clear => Ok(Request::Clear {
                username: required(username)?,
            }),
            Command::Post => Ok(Request::Post {
                username: required(username)?,
                text: fields.next().unwrap_or_default().to_string(),
            }),
            Command::Update | Command::Error => Err(DecodeError::UnsupportedCommand(code)),
        }
    }

    /// Command code of this request
    pub fn command(&self) -> Command {
        match self {
            Request::Null { .. } => Command::Null,
            Request::Connect { .. } => Command::Connect,
            Request::Disconnect { .. } => Command::Disconnect,
            Request::Clear { .. } => Command::Clear,
            Request::Post { .. } => Command::Post,
        }
    }

    /// Encode as a request line, the way a client sends it
    pub fn encode(&self) -> String {
        let code = self.command().code();
        match self {
            Request::Null { username: None } => code.to_string(),
            Request::Null {
                username: Some(username),
            }
            | Request::Connect { username }
            | Request::Disconnect { username }
            | Request::Clear { username } => format!("{} {}", code, username),
            Request::Post { username, text } => format!("{} {} {}", code, username, text),
        }
    }
}

/// Server → Client response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Poll echo, nothing changed
    Null,
    /// Username accepted
    Connected { username: String },
    /// Message posted
    Posted(Message),
    /// Membership changed since the last consumed poll
    Update { usernames: Vec<String> },
    /// Request refused
    Error { message: String },
}

impl Response {
    /// Encode as a single line (without newline)
    pub fn encode(&self) -> String {
        match self {
            Response::Null => Command::Null.code().to_string(),
            Response::Connected { username } => username.clone(),
            Response::Posted(message) => message.to_string(),
            // Usernames are concatenated without a separator; clients
            // depend on this shape.
            Response::Update { usernames } => {
                format!("{} {}", Command::Update.code(), usernames.concat())
            }
            Response::Error { message } => format!("{} {}", Command::Error.code(), message),
        }
    }
}

/// Convert AppError to an error response for client notification
impl From<AppError> for Response {
    fn from(err: AppError) -> Self {
        let message = match &err {
            AppError::DuplicateUser(_) => err.to_string(),
            // Connection-scoped errors are not normally reported in-band
            _ => "internal error".to_string(),
        };
        Response::Error { message }
    }
}
