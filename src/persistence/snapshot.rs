//! Grid snapshot codec
//!
//! ## Layout
//! ```text
//! ┌────────────┬───────────────┬──────────────────────────────────────┐
//! │ rows (u64) │ columns (u64) │ cell × (rows * columns), row-major   │
//! └────────────┴───────────────┴──────────────────────────────────────┘
//!
//! cell = [len: u64][len bytes]
//!   present: text bytes followed by a zero terminator
//!   absent:  a single zero byte (len = 1)
//! ```
//! Integers are little-endian.

use bytes::{Buf, BufMut, Bytes};

use super::GRID_ENCODING_VERSION;
use crate::error::{GridError, Result};
use crate::grid::{Cell, Grid, GridStore, StorageBackend};

/// Size of an unsigned integer or a buffer length on the stream
const WORD_SIZE: usize = 8;

/// Smallest possible encoded cell: length word plus the terminator
const MIN_CELL_SIZE: usize = WORD_SIZE + 1;

// =============================================================================
// Stream Abstraction
// =============================================================================

/// Sequential sink a snapshot is written into
pub trait SnapshotWriter {
    fn save_unsigned(&mut self, value: u64);
    fn save_string_buffer(&mut self, buffer: &[u8]);
}

/// Sequential source a snapshot is read back from
pub trait SnapshotReader {
    fn load_unsigned(&mut self) -> Result<u64>;
    fn load_string_buffer(&mut self) -> Result<Bytes>;

    /// Bytes left on the stream
    fn remaining_bytes(&self) -> usize;
}

impl<B: BufMut> SnapshotWriter for B {
    fn save_unsigned(&mut self, value: u64) {
        self.put_u64_le(value);
    }

    fn save_string_buffer(&mut self, buffer: &[u8]) {
        self.put_u64_le(buffer.len() as u64);
        self.put_slice(buffer);
    }
}

impl<B: Buf> SnapshotReader for B {
    fn load_unsigned(&mut self) -> Result<u64> {
        if self.remaining() < WORD_SIZE {
            return Err(GridError::Corruption(format!(
                "truncated snapshot: expected {} bytes, got {}",
                WORD_SIZE,
                self.remaining()
            )));
        }
        Ok(self.get_u64_le())
    }

    fn load_string_buffer(&mut self) -> Result<Bytes> {
        let len = usize::try_from(self.load_unsigned()?)
            .map_err(|_| GridError::Corruption("string buffer length overflows".to_string()))?;
        if self.remaining() < len {
            return Err(GridError::Corruption(format!(
                "truncated string buffer: expected {} bytes, got {}",
                len,
                self.remaining()
            )));
        }
        Ok(self.copy_to_bytes(len))
    }

    fn remaining_bytes(&self) -> usize {
        self.remaining()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Write `grid` to `writer`
pub fn encode<W: SnapshotWriter + ?Sized>(grid: &Grid, writer: &mut W) {
    match grid {
        Grid::Flat(store) => encode_store(store, writer),
        Grid::RowWise(store) => encode_store(store, writer),
    }
}

/// Encode a grid into a fresh buffer
pub fn encode_to_vec(grid: &Grid) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(grid));
    encode(grid, &mut buf);
    buf
}

/// Exact number of bytes `encode` writes for `grid`
pub fn encoded_len(grid: &Grid) -> usize {
    2 * WORD_SIZE
        + grid
            .cells()
            .map(|cell| WORD_SIZE + cell.as_ref().map_or(1, |text| text.len() + 1))
            .sum::<usize>()
}

fn encode_store<G: GridStore, W: SnapshotWriter + ?Sized>(store: &G, writer: &mut W) {
    writer.save_unsigned(store.rows() as u64);
    writer.save_unsigned(store.columns() as u64);

    let mut terminated = Vec::new();
    for cell in store.cells() {
        match cell {
            Some(text) => {
                terminated.clear();
                terminated.extend_from_slice(text.as_bytes());
                terminated.push(0);
                writer.save_string_buffer(&terminated);
            }
            None => writer.save_string_buffer(&[0]),
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Read a grid back from `reader`, building it on `backend`
///
/// `encoding_version` is the version the snapshot was written with; any
/// version other than the current one is rejected outright.
pub fn decode<R: SnapshotReader + ?Sized>(
    reader: &mut R,
    encoding_version: u32,
    backend: StorageBackend,
) -> Result<Grid> {
    if encoding_version != GRID_ENCODING_VERSION {
        tracing::warn!(encoding_version, "cannot load grid snapshot with this encoding version");
        return Err(GridError::UnsupportedEncodingVersion(encoding_version));
    }

    let rows = reader.load_unsigned()?;
    let columns = reader.load_unsigned()?;
    let too_large = || GridError::GridTooLarge { rows, columns };
    let (rows, columns) = (
        usize::try_from(rows).map_err(|_| too_large())?,
        usize::try_from(columns).map_err(|_| too_large())?,
    );
    if rows == 0 || columns == 0 {
        return Err(GridError::Corruption("zero-sized grid in snapshot".to_string()));
    }
    let len = rows.checked_mul(columns).ok_or_else(too_large)?;

    // Every cell takes at least MIN_CELL_SIZE bytes; reject impossible counts
    // before allocating for them
    if len.saturating_mul(MIN_CELL_SIZE) > reader.remaining_bytes() {
        return Err(GridError::Corruption(format!(
            "snapshot declares {} cells but only {} bytes remain",
            len,
            reader.remaining_bytes()
        )));
    }

    let mut cells: Vec<Cell> = Vec::new();
    cells.try_reserve_exact(len)?;
    for _ in 0..len {
        let buffer = reader.load_string_buffer()?;
        cells.push(decode_cell(&buffer)?);
    }

    Grid::from_row_major(backend, rows, columns, cells)
}

/// Decode a grid from a byte slice
pub fn decode_from_slice(
    mut bytes: &[u8],
    encoding_version: u32,
    backend: StorageBackend,
) -> Result<Grid> {
    decode(&mut bytes, encoding_version, backend)
}

fn decode_cell(buffer: &[u8]) -> Result<Cell> {
    match buffer {
        [0] => Ok(None),
        [text @ .., 0] => String::from_utf8(text.to_vec())
            .map(Some)
            .map_err(|e| GridError::Corruption(format!("cell is not valid UTF-8: {}", e))),
        [] => Err(GridError::Corruption("empty cell buffer".to_string())),
        _ => Err(GridError::Corruption("cell buffer missing terminator".to_string())),
    }
}
