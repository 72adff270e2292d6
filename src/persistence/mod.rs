//! Persistence Module
//!
//! Everything that turns a grid into bytes or numbers.
//!
//! ## Responsibilities
//! - Binary snapshot encode/decode of a single grid
//! - Re-emitting a grid as replayable log operations
//! - Memory accounting and content digest
//! - The keyspace snapshot file that holds many grids
//!
//! All of these read cells row-major, so both storage backends produce
//! byte-identical snapshots, identical rewrite records and identical digests.

pub mod snapshot;
pub mod rewrite;
pub mod accounting;
mod file;

pub use snapshot::{SnapshotReader, SnapshotWriter};
pub use accounting::{memory_footprint, Crc32Digest, DigestSink};
pub use rewrite::{rewrite_operation, rewrite_operations};
pub use file::{SnapshotEntry, SnapshotFile};

/// Encoding version of the grid snapshot layout
pub const GRID_ENCODING_VERSION: u32 = 0;
