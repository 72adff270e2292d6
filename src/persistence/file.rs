//! Keyspace snapshot file
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (18 bytes)                                            │
//! │   Magic: "GRDS" (4) | Version: u16 (2)                       │
//! │   GridEncoding: u32 (4) | Count: u64 (8)                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Entries (variable)                                           │
//! │   [Kind: u8][KeyLen: u32][Key][PayloadLen: u64][Payload]     │
//! │   Kind 0 = grid snapshot, Kind 1 = plain text value          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                             │
//! │   CRC32 of everything above                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{snapshot, GRID_ENCODING_VERSION};
use crate::error::{GridError, Result};
use crate::engine::Value;
use crate::grid::StorageBackend;

/// Magic bytes identifying a GridKV snapshot file
const MAGIC: &[u8; 4] = b"GRDS";

/// Current snapshot file format version
const VERSION: u16 = 1;

/// Magic (4) + Version (2) + GridEncoding (4) + Count (8)
const HEADER_SIZE: usize = 18;

/// CRC32 (4)
const FOOTER_SIZE: usize = 4;

const KIND_GRID: u8 = 0;
const KIND_TEXT: u8 = 1;

/// One key and its value, as read back from a snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub key: Vec<u8>,
    pub value: Value,
}

/// Reads and writes whole-keyspace snapshot files
pub struct SnapshotFile;

impl SnapshotFile {
    /// Write every entry to `path`, replacing any previous snapshot
    ///
    /// The file is assembled beside the target and renamed into place.
    pub fn write<'a, I>(path: &Path, entries: I) -> Result<u64>
    where
        I: IntoIterator<Item = (&'a [u8], &'a Value)>,
    {
        let mut body = BytesMut::new();
        let mut count: u64 = 0;

        for (key, value) in entries {
            let key_len = u32::try_from(key.len()).map_err(|_| {
                GridError::Serialization(format!("key too long: {} bytes", key.len()))
            })?;

            match value {
                Value::Grid(grid) => {
                    body.put_u8(KIND_GRID);
                    body.put_u32_le(key_len);
                    body.put_slice(key);
                    body.put_u64_le(snapshot::encoded_len(grid) as u64);
                    snapshot::encode(grid, &mut body);
                }
                Value::Text(text) => {
                    body.put_u8(KIND_TEXT);
                    body.put_u32_le(key_len);
                    body.put_slice(key);
                    body.put_u64_le(text.len() as u64);
                    body.put_slice(text);
                }
            }
            count += 1;
        }

        let mut file_bytes = BytesMut::with_capacity(HEADER_SIZE + body.len() + FOOTER_SIZE);
        file_bytes.put_slice(MAGIC);
        file_bytes.put_u16_le(VERSION);
        file_bytes.put_u32_le(GRID_ENCODING_VERSION);
        file_bytes.put_u64_le(count);
        file_bytes.put_slice(&body);
        let crc = crc32fast::hash(&file_bytes);
        file_bytes.put_u32_le(crc);

        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&file_bytes)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;

        tracing::debug!(entries = count, bytes = file_bytes.len(), "snapshot written");
        Ok(count)
    }

    /// Read a snapshot file, building grids on `backend`
    pub fn read(path: &Path, backend: StorageBackend) -> Result<Vec<SnapshotEntry>> {
        let raw = Bytes::from(fs::read(path)?);
        if raw.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(GridError::Corruption(format!(
                "snapshot file too short: {} bytes",
                raw.len()
            )));
        }

        let crc_offset = raw.len() - FOOTER_SIZE;
        let expected = (&raw[crc_offset..]).get_u32_le();
        let actual = crc32fast::hash(&raw[..crc_offset]);
        if expected != actual {
            return Err(GridError::Corruption(format!(
                "snapshot CRC mismatch: expected {:08x}, got {:08x}",
                expected, actual
            )));
        }

        let mut buf = raw.slice(..crc_offset);
        if &buf[..4] != MAGIC {
            return Err(GridError::Corruption(format!(
                "invalid snapshot magic: expected GRDS, got {:?}",
                &buf[..4]
            )));
        }
        buf.advance(4);

        let version = buf.get_u16_le();
        if version != VERSION {
            return Err(GridError::Corruption(format!(
                "unsupported snapshot file version: {}",
                version
            )));
        }
        let encoding_version = buf.get_u32_le();
        let count = buf.get_u64_le();

        let mut entries = Vec::new();
        for _ in 0..count {
            entries.push(Self::read_entry(&mut buf, encoding_version, backend)?);
        }

        if buf.has_remaining() {
            return Err(GridError::Corruption(format!(
                "{} unexpected bytes after last snapshot entry",
                buf.remaining()
            )));
        }

        tracing::debug!(entries = entries.len(), %backend, "snapshot loaded");
        Ok(entries)
    }

    fn read_entry(
        buf: &mut Bytes,
        encoding_version: u32,
        backend: StorageBackend,
    ) -> Result<SnapshotEntry> {
        let truncated = || GridError::Corruption("truncated snapshot entry".to_string());

        if buf.remaining() < 5 {
            return Err(truncated());
        }
        let kind = buf.get_u8();
        let key_len = buf.get_u32_le() as usize;
        if buf.remaining() < key_len + 8 {
            return Err(truncated());
        }
        let key = buf.split_to(key_len).to_vec();
        let payload_len = usize::try_from(buf.get_u64_le()).map_err(|_| truncated())?;
        if buf.remaining() < payload_len {
            return Err(truncated());
        }
        let mut payload = buf.split_to(payload_len);

        let value = match kind {
            KIND_GRID => {
                let grid = snapshot::decode(&mut payload, encoding_version, backend)?;
                if payload.has_remaining() {
                    return Err(GridError::Corruption(format!(
                        "grid payload for key {:?} has {} trailing bytes",
                        String::from_utf8_lossy(&key),
                        payload.remaining()
                    )));
                }
                Value::Grid(grid)
            }
            KIND_TEXT => Value::Text(payload.to_vec()),
            other => {
                return Err(GridError::Corruption(format!(
                    "unknown snapshot entry kind: {}",
                    other
                )))
            }
        };

        Ok(SnapshotEntry { key, value })
    }
}
