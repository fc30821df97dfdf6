//! Append-only request log
//!
//! Every raw request line, serviced or not, is appended as
//! `yyyy-MM-dd HH:mm:ss <line>`. Logging is best-effort: callers report
//! failures and keep servicing.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Timestamp prefix format of every log record
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Record written once when the server starts
pub const LOG_SERVER_START: &str = "MBSERVER STARTED";

/// Shared append-only log file
///
/// The file is opened on first use and reopened after a failure, so a
/// store that comes back is picked up again.
#[derive(Debug)]
pub struct RequestLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl RequestLog {
    /// Create a log writing to `path`; nothing is opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped record
    ///
    /// Appends are serialized; each record is a single write.
    pub async fn append(&self, line: &str) -> io::Result<()> {
        let record = format_record(&Local::now().format(LOG_TIME_FORMAT).to_string(), line);

        let mut guard = self.file.lock().await;
        let mut file = match guard.take() {
            Some(file) => file,
            None => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await?
            }
        };

        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        // Only a handle that just worked is kept; after a failure the
        // next append reopens
        *guard = Some(file);
        Ok(())
    }
}

fn format_record(timestamp: &str, line: &str) -> String {
    // Embedded newlines would split one request across records
    let line = line.replace(['\r', '\n'], " ");
    format!("{} {}\n", timestamp, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record("2019-06-06 10:00:00", "1 alice"),
            "2019-06-06 10:00:00 1 alice\n"
        );
        assert_eq!(format_record("t", "a\r\nb"), "t a  b\n");
    }

    #[tokio::test]
    async fn test_append_creates_and_appends() {
        let dir = TempDir::new().expect("tempdir");
        let log = RequestLog::new(dir.path().join("logfile.txt"));

        log.append("1 alice").await.unwrap();
        log.append("xyz").await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" 1 alice"));
        assert!(lines[1].ends_with(" xyz"));

        // "yyyy-MM-dd HH:mm:ss " prefix
        let stamp = &lines[0][..19];
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, LOG_TIME_FORMAT).is_ok());
    }

    #[tokio::test]
    async fn test_append_failure_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let log = RequestLog::new(dir.path().join("missing").join("logfile.txt"));

        assert!(log.append("1 alice").await.is_err());
        // Still failing, still not panicking
        assert!(log.append("2 alice").await.is_err());
    }

    #[tokio::test]
    async fn test_append_reopens_after_failure() {
        let dir = TempDir::new().expect("tempdir");
        let sub = dir.path().join("later");
        let log = RequestLog::new(sub.join("logfile.txt"));

        assert!(log.append("1 alice").await.is_err());

        std::fs::create_dir(&sub).unwrap();
        log.append("2 alice").await.unwrap();
        log.append("0").await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" 2 alice"));
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let dir = TempDir::new().expect("tempdir");
        let log = std::sync::Arc::new(RequestLog::new(dir.path().join("logfile.txt")));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move { log.append(&format!("4 user{} text", i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 20);
        assert!(contents.lines().all(|l| l.ends_with(" text")));
    }
}
