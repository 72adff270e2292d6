//! Command log entry definitions
//!
//! Defines the structure of individual log entries and their on-disk frame.

use bytes::Buf;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Largest operation payload a frame may carry (256 MB)
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// A single entry in the command log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to replay
    pub operation: Operation,
}

/// Mutations that can be logged and replayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create, resize, or resize-and-replace a grid
    Dimension {
        key: Vec<u8>,
        rows: u64,
        columns: u64,
        values: Option<Vec<String>>,
    },

    /// Overwrite a rectangle of an existing grid
    SetRange {
        key: Vec<u8>,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
        values: Vec<String>,
    },

    /// Store a plain value
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Remove a key of any kind
    Delete { key: Vec<u8> },
}

impl Operation {
    /// Key the operation targets
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Dimension { key, .. }
            | Operation::SetRange { key, .. }
            | Operation::Put { key, .. }
            | Operation::Delete { key } => key,
        }
    }
}

/// Outcome of decoding one frame from a byte stream
#[derive(Debug)]
pub enum Frame {
    /// A valid entry and the number of bytes it occupied
    Entry(LogEntry, usize),

    /// The bytes end partway through a frame
    Truncated,

    /// The frame is complete but its checksum or payload is bad
    Corrupted(String),
}

impl LogEntry {
    pub fn new(lsn: u64, operation: Operation) -> Self {
        Self { lsn, operation }
    }

    /// Encode as `[lsn: u64][crc: u32][len: u32][bincode(operation)]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        encode_frame(self.lsn, &self.operation)
    }

    /// Decode one complete frame
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        match Self::decode_frame(bytes) {
            Frame::Entry(entry, _) => Ok(entry),
            Frame::Truncated => Err(GridError::Corruption(format!(
                "incomplete log frame ({} bytes)",
                bytes.len()
            ))),
            Frame::Corrupted(reason) => Err(GridError::Corruption(reason)),
        }
    }

    /// Decode the frame at the start of `bytes`
    pub fn decode_frame(bytes: &[u8]) -> Frame {
        if bytes.len() < HEADER_SIZE {
            return Frame::Truncated;
        }

        let mut header = &bytes[..HEADER_SIZE];
        let lsn = header.get_u64_le();
        let crc = header.get_u32_le();
        let len = header.get_u32_le() as usize;

        if len > MAX_PAYLOAD_SIZE {
            return Frame::Corrupted(format!("frame length {} exceeds maximum", len));
        }
        if bytes.len() < HEADER_SIZE + len {
            return Frame::Truncated;
        }

        let payload = &bytes[HEADER_SIZE..HEADER_SIZE + len];
        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Frame::Corrupted(format!(
                "CRC mismatch at lsn {}: expected {:08x}, got {:08x}",
                lsn, crc, actual
            ));
        }

        match bincode::deserialize::<Operation>(payload) {
            Ok(operation) => Frame::Entry(LogEntry { lsn, operation }, HEADER_SIZE + len),
            Err(e) => Frame::Corrupted(format!("undecodable operation at lsn {}: {}", lsn, e)),
        }
    }
}

/// Encode one frame without taking ownership of the operation
pub(crate) fn encode_frame(lsn: u64, operation: &Operation) -> Result<Vec<u8>> {
    let payload = bincode::serialize(operation)?;
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(GridError::Serialization(format!(
            "log entry too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&lsn.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
