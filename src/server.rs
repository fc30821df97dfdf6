//! Connection acceptor
//!
//! Binds the listening socket and spawns one session task per accepted
//! connection. Every session shares the same board and request log.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::board::Board;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::request_log::{RequestLog, LOG_SERVER_START};
use crate::session::{handle_connection, SessionContext};
use crate::types::ConnectionId;

/// A bound message board server
pub struct Server {
    listener: TcpListener,
    ctx: SessionContext,
}

impl Server {
    /// Bind the listening socket on all interfaces
    ///
    /// A bind failure is returned; the caller treats it as fatal.
    pub async fn bind(config: &ServerConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?;

        let board = Arc::new(Board::new());
        let log = Arc::new(RequestLog::new(config.log_path.clone()));
        if let Err(e) = log.append(LOG_SERVER_START).await {
            warn!("Failed to write {}: {}", log.path().display(), e);
        }

        Ok(Self {
            listener,
            ctx: SessionContext::new(board, log, config),
        })
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared board handle
    pub fn board(&self) -> Arc<Board> {
        Arc::clone(&self.ctx.board)
    }

    /// Run the accept loop forever
    ///
    /// Accept errors are logged and the loop continues.
    pub async fn run(self) {
        let mut next_id = ConnectionId::default();

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = next_id.fetch_next();
                    info!("New connection {} from {}", id, addr);
                    let ctx = self.ctx.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, id, ctx).await {
                            warn!("Connection {} ended: {}", id, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Bind on `config.port` and serve until the process is terminated
pub async fn run(config: ServerConfig) -> Result<(), AppError> {
    let server = Server::bind(&config).await?;
    info!("Message board listening on {}", server.local_addr()?);
    server.run().await;
    Ok(())
}
