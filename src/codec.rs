//! Request line framing
//!
//! Splits the byte stream on `\n`. Unlike `LinesCodec`, a line that is
//! not UTF-8 or is too long does not end the stream: it comes out as a
//! `RequestFrame::Malformed` so the session can log and discard it and
//! keep reading.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

/// One framed request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFrame {
    /// Well-formed UTF-8 line, without its newline
    Line(String),
    /// Line that cannot be a request; `raw` is a lossy rendering for the log
    Malformed { raw: String, reason: FrameError },
}

impl RequestFrame {
    /// Text to record in the request log
    pub fn raw(&self) -> &str {
        match self {
            RequestFrame::Line(line) => line,
            RequestFrame::Malformed { raw, .. } => raw,
        }
    }
}

/// Newline-delimited codec for request lines and response lines
#[derive(Debug, Clone)]
pub struct RequestLineCodec {
    max_length: usize,
    /// Bytes already scanned for a newline
    next_index: usize,
    /// Kept prefix of an over-long line being skipped
    overflow: Option<String>,
}

impl RequestLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            overflow: None,
        }
    }

    fn too_long(&self, prefix: &[u8]) -> RequestFrame {
        RequestFrame::Malformed {
            raw: String::from_utf8_lossy(prefix).into_owned(),
            reason: FrameError::TooLong(self.max_length),
        }
    }

    fn frame(&self, line: &[u8]) -> RequestFrame {
        if line.len() > self.max_length {
            return self.too_long(&line[..self.max_length]);
        }
        match std::str::from_utf8(line) {
            Ok(text) => RequestFrame::Line(text.to_string()),
            Err(_) => RequestFrame::Malformed {
                raw: String::from_utf8_lossy(line).into_owned(),
                reason: FrameError::InvalidUtf8,
            },
        }
    }
}

impl Decoder for RequestLineCodec {
    type Item = RequestFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.next_index.min(src.len());
        let Some(offset) = src[start..].iter().position(|&b| b == b'\n') else {
            if self.overflow.is_some() {
                // Still inside an over-long line
                src.clear();
                self.next_index = 0;
            } else if src.len() > self.max_length {
                self.overflow = Some(String::from_utf8_lossy(&src[..self.max_length]).into_owned());
                src.clear();
                self.next_index = 0;
            } else {
                self.next_index = src.len();
            }
            return Ok(None);
        };

        let end = start + offset;
        let line = src.split_to(end + 1);
        self.next_index = 0;

        if let Some(raw) = self.overflow.take() {
            return Ok(Some(RequestFrame::Malformed {
                raw,
                reason: FrameError::TooLong(self.max_length),
            }));
        }
        Ok(Some(self.frame(&line[..end])))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        self.next_index = 0;
        // Unterminated last line
        if let Some(raw) = self.overflow.take() {
            src.clear();
            return Ok(Some(RequestFrame::Malformed {
                raw,
                reason: FrameError::TooLong(self.max_length),
            }));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let line = src.split();
        Ok(Some(self.frame(&line)))
    }
}

impl Encoder<String> for RequestLineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
