//! Server configuration
//!
//! The only command line input is the listening port. The log path and
//! idle timeout have defaults that can be overridden from the
//! environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default request log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "logfile.txt";

/// Default read-idle timeout per connection
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// Longer request lines are logged truncated and discarded
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Environment variable overriding the log file path
pub const ENV_LOG_FILE: &str = "MSGBOARD_LOG_FILE";

/// Environment variable overriding the idle timeout (`0` disables it)
pub const ENV_IDLE_TIMEOUT: &str = "MSGBOARD_IDLE_TIMEOUT_SECS";

/// Runtime settings for the acceptor and sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    /// Request log file
    pub log_path: PathBuf,
    /// Close connections that send nothing for this long
    pub idle_timeout: Option<Duration>,
    /// Longest serviced request line in bytes
    pub max_line_length: usize,
}

impl ServerConfig {
    /// Config with defaults for everything but the port
    pub fn new(port: u16) -> Self {
        Self {
            port,
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            idle_timeout: Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Build from the arguments after the program name
    ///
    /// Only the first argument is read; it must be a port in 0..=65535.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let arg = args.into_iter().next().ok_or(ConfigError::MissingPort)?;
        let arg = arg.as_ref();
        let port = arg
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(arg.to_string()))?;
        Ok(Self::new(port))
    }

    /// Apply `MSGBOARD_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_LOG_FILE).ok(),
            std::env::var(ENV_IDLE_TIMEOUT).ok(),
        )
    }

    fn with_overrides(mut self, log_file: Option<String>, idle_secs: Option<String>) -> Self {
        if let Some(path) = log_file.filter(|p| !p.is_empty()) {
            self.log_path = PathBuf::from(path);
        }
        // Unparseable values keep the default
        if let Some(secs) = idle_secs.and_then(|s| s.trim().parse::<u64>().ok()) {
            self.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        self
    }
}
