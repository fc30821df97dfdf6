//! Message Board Server - Entry Point
//!
//! Reads the listening port, binds the listener and accepts connections.

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use message_board::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=message_board=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("message_board=info")),
        )
        .init();

    let config = match ServerConfig::from_args(env::args().skip(1)) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: message_board <port>");
            return ExitCode::FAILURE;
        }
    };

    // Only returns on bind failure
    if let Err(e) = message_board::run(config).await {
        error!("Failed to start server: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
