//! Command log reader
//!
//! Walks the frames of a log that has been read into memory.

use std::fs;
use std::path::Path;

use super::entry::{Frame, LogEntry};
use crate::error::Result;

/// Reads entries from a command log buffer
pub struct LogReader {
    data: Vec<u8>,
    position: usize,
    stopped: Option<Stop>,
}

/// Why a reader stopped before the end of its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// The data ends partway through a frame
    Truncated,

    /// A frame failed its checksum or could not be decoded
    Corrupted(String),
}

impl LogReader {
    /// Read a whole log file (a missing file reads as empty)
    pub fn open(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_bytes(data))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            stopped: None,
        }
    }

    /// Next valid entry, or `None` at the end of the valid prefix
    pub fn next_entry(&mut self) -> Option<LogEntry> {
        if self.stopped.is_some() || self.position >= self.data.len() {
            return None;
        }

        match LogEntry::decode_frame(&self.data[self.position..]) {
            Frame::Entry(entry, consumed) => {
                self.position += consumed;
                Some(entry)
            }
            Frame::Truncated => {
                self.stopped = Some(Stop::Truncated);
                None
            }
            Frame::Corrupted(reason) => {
                self.stopped = Some(Stop::Corrupted(reason));
                None
            }
        }
    }

    /// Byte length of the valid prefix read so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total bytes in the log
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stop_reason(&self) -> Option<&Stop> {
        self.stopped.as_ref()
    }
}

impl Iterator for LogReader {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        self.next_entry()
    }
}
