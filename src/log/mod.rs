//! Command Log Module
//!
//! Append-only record of every mutation, replayed on startup.
//!
//! ## Responsibilities
//! - Append an entry for each successful mutating command
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Recovery of the valid prefix after a crash
//! - Rewrite into one record per key (see `persistence::rewrite`)
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! `Data` is the bincode encoding of an [`Operation`].

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{LogEntry, Operation, Frame, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use writer::LogWriter;
pub use reader::{LogReader, Stop};
pub use recovery::{LogRecovery, RecoveryResult};
