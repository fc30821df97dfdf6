//! Per-connection session handling
//!
//! Reads request lines, applies them to the shared board, writes
//! responses and records every raw line in the request log. A session is
//! `Open` until a CONNECT binds a username, `Bound` afterwards, and
//! `Closed` once the client disconnects or the transport ends.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::codec::{RequestFrame, RequestLineCodec};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::protocol::{Request, Response};
use crate::request_log::RequestLog;
use crate::types::ConnectionId;

/// Connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No username bound
    Open,
    /// CONNECT accepted for this username
    Bound(String),
    /// Terminal
    Closed,
}

/// Server-side state of one client connection
#[derive(Debug)]
pub struct Session {
    id: ConnectionId,
    board: Arc<Board>,
    state: SessionState,
}

impl Session {
    /// Create an `Open` session
    pub fn new(id: ConnectionId, board: Arc<Board>) -> Self {
        Self {
            id,
            board,
            state: SessionState::Open,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Bound username, if any
    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Bound(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Service one raw request line
    ///
    /// Returns the response to write back, if the command has one.
    /// Lines that fail to decode are discarded.
    pub fn service(&mut self, line: &str) -> Option<Response> {
        if self.is_closed() {
            return None;
        }

        let request = match Request::decode(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Discarding request from {}: {}", self.id, e);
                return None;
            }
        };
        debug!("Request from {}: {:?}", self.id, request);

        match request {
            Request::Null { .. } => Some(self.handle_poll()),
            Request::Connect { username } => Some(self.handle_connect(username)),
            Request::Disconnect { .. } => {
                self.close();
                None
            }
            Request::Clear { .. } => {
                let removed = self.board.clear_messages();
                info!("Connection {} cleared {} messages", self.id, removed);
                None
            }
            Request::Post { text, .. } => self.handle_post(&text),
        }
    }

    /// Release the bound username and enter `Closed`
    ///
    /// Safe to call repeatedly; the user is removed at most once.
    pub fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, SessionState::Closed);
        if let SessionState::Bound(username) = previous {
            if self.board.remove_user(&username).is_some() {
                info!("User '{}' left (connection {})", username, self.id);
            }
        }
    }

    fn handle_poll(&self) -> Response {
        match self.board.take_update() {
            Some(usernames) => Response::Update { usernames },
            None => Response::Null,
        }
    }

    fn handle_connect(&mut self, username: String) -> Response {
        // Repeating the bound name changes nothing
        if self.username() == Some(username.as_str()) {
            return Response::Connected { username };
        }

        let result = match self.username() {
            Some(old) => self.board.rename_user(self.id, old, &username),
            None => self.board.add_user(self.id, &username),
        };
        if let Err(e) = result {
            warn!("Connection {} rejected: {}", self.id, e);
            return e.into();
        }

        let previous = std::mem::replace(&mut self.state, SessionState::Bound(username.clone()));
        if let SessionState::Bound(old) = previous {
            info!("Connection {} renamed '{}' to '{}'", self.id, old, username);
        } else {
            info!("User '{}' joined (connection {})", username, self.id);
        }

        Response::Connected { username }
    }

    fn handle_post(&self, text: &str) -> Option<Response> {
        let Some(username) = self.username() else {
            warn!("Ignoring POST from unbound connection {}", self.id);
            return None;
        };

        let message = self.board.add_message(username, text);
        Some(Response::Posted(message))
    }
}

/// Shared handles every session needs
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub board: Arc<Board>,
    pub log: Arc<RequestLog>,
    pub idle_timeout: Option<Duration>,
    pub max_line_length: usize,
}

impl SessionContext {
    pub fn new(board: Arc<Board>, log: Arc<RequestLog>, config: &ServerConfig) -> Self {
        Self {
            board,
            log,
            idle_timeout: config.idle_timeout,
            max_line_length: config.max_line_length,
        }
    }
}

/// Handle one client connection until it closes
///
/// Whatever ends the connection (DISCONNECT, EOF, transport error or idle
/// timeout), the bound user is removed from the board before returning.
pub async fn handle_connection<S>(
    stream: S,
    id: ConnectionId,
    ctx: SessionContext,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, RequestLineCodec::new(ctx.max_line_length));
    let mut session = Session::new(id, Arc::clone(&ctx.board));

    let result = serve(&mut framed, &mut session, &ctx).await;
    session.close();

    debug!("Connection {} closed", id);
    result
}

async fn serve<S>(
    framed: &mut Framed<S, RequestLineCodec>,
    session: &mut Session,
    ctx: &SessionContext,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while !session.is_closed() {
        let Some(frame) = next_frame(framed, ctx.idle_timeout).await? else {
            debug!("Connection {} reached EOF", session.id());
            break;
        };

        if let Err(e) = ctx.log.append(frame.raw()).await {
            warn!(
                "Failed to log request to {}: {}",
                ctx.log.path().display(),
                e
            );
        }

        let response = match frame {
            RequestFrame::Line(line) => session.service(&line),
            RequestFrame::Malformed { reason, .. } => {
                warn!("Discarding request from {}: {}", session.id(), reason);
                None
            }
        };
        if let Some(response) = response {
            framed.send(response.encode()).await?;
        }
    }
    Ok(())
}

async fn next_frame<S>(
    framed: &mut Framed<S, RequestLineCodec>,
    idle_timeout: Option<Duration>,
) -> Result<Option<RequestFrame>, AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, framed.next())
            .await
            .map_err(|_| AppError::IdleTimeout(limit))?,
        None => framed.next().await,
    };
    Ok(next.transpose()?)
}
