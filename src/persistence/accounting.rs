//! Memory accounting and content digest

use std::mem;

use crate::grid::{Grid, GridStore};

/// Approximate heap and inline bytes held by `grid`
///
/// Counts the grid value itself, the backend's cell handles and row
/// bookkeeping, and every present cell's text plus one terminator byte.
/// Allocator slack is not included, so compare results against each other
/// rather than against an exact figure.
pub fn memory_footprint(grid: &Grid) -> usize {
    match grid {
        Grid::Flat(store) => store_footprint(store),
        Grid::RowWise(store) => store_footprint(store),
    }
}

fn store_footprint<G: GridStore>(store: &G) -> usize {
    let text: usize = store
        .cells()
        .map(|cell| cell.as_ref().map_or(0, |text| text.len() + 1))
        .sum();
    mem::size_of::<Grid>() + store.handle_overhead() + text
}

// =============================================================================
// Digest
// =============================================================================

/// Order-sensitive fingerprint accumulator
pub trait DigestSink {
    fn add_integer(&mut self, value: i64);
    fn add_buffer(&mut self, buffer: &[u8]);

    /// Close the current sequence of values
    fn end_sequence(&mut self);
}

/// Feed `grid` into `sink`: dimensions, then every cell row-major
///
/// Present cells contribute their bytes plus a zero terminator, absent cells a
/// single zero byte, so the result is the same on either backend.
pub fn digest<D: DigestSink + ?Sized>(grid: &Grid, sink: &mut D) {
    match grid {
        Grid::Flat(store) => digest_store(store, sink),
        Grid::RowWise(store) => digest_store(store, sink),
    }
}

fn digest_store<G: GridStore, D: DigestSink + ?Sized>(store: &G, sink: &mut D) {
    sink.add_integer(store.rows() as i64);
    sink.add_integer(store.columns() as i64);

    let mut terminated = Vec::new();
    for cell in store.cells() {
        match cell {
            Some(text) => {
                terminated.clear();
                terminated.extend_from_slice(text.as_bytes());
                terminated.push(0);
                sink.add_buffer(&terminated);
            }
            None => sink.add_buffer(&[0]),
        }
    }

    sink.end_sequence();
}

/// CRC32-based [`DigestSink`]
///
/// Each buffer is prefixed with its length so neighbouring buffers cannot
/// run together.
#[derive(Debug, Clone, Default)]
pub struct Crc32Digest {
    hasher: crc32fast::Hasher,
    sequences: u64,
}

impl Crc32Digest {
    /// Marks the end of a sequence in the hashed stream
    const SEQUENCE_MARKER: u8 = 0xFF;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of closed sequences
    pub fn sequences(&self) -> u64 {
        self.sequences
    }

    pub fn finish(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

impl DigestSink for Crc32Digest {
    fn add_integer(&mut self, value: i64) {
        self.hasher.update(&value.to_le_bytes());
    }

    fn add_buffer(&mut self, buffer: &[u8]) {
        self.hasher.update(&(buffer.len() as u64).to_le_bytes());
        self.hasher.update(buffer);
    }

    fn end_sequence(&mut self) {
        self.sequences += 1;
        self.hasher.update(&[Self::SEQUENCE_MARKER]);
    }
}

/// Digest `grid` with a fresh [`Crc32Digest`]
pub fn checksum(grid: &Grid) -> u32 {
    let mut sink = Crc32Digest::new();
    digest(grid, &mut sink);
    sink.finish()
}
