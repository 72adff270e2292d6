//! Command log recovery
//!
//! Reads back the valid prefix of a log after a restart or crash.

use std::fs::OpenOptions;
use std::path::Path;

use super::entry::LogEntry;
use super::reader::{LogReader, Stop};
use crate::error::Result;

/// Handles log recovery after a restart
pub struct LogRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted frames found (recovery stops at the first one)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether invalid bytes were cut off the end of the log
    pub was_truncated: bool,
}

impl LogRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read entries up to the first torn or corrupted frame
    /// 2. Truncate the file back to the end of the last valid frame
    /// 3. Return the valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult)> {
        let (entries, result, valid_len) = Self::scan(path)?;

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Report what `recover` would find without modifying the file
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result, _) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult, usize)> {
        let mut reader = LogReader::open(path)?;
        let entries: Vec<LogEntry> = reader.by_ref().collect();

        let mut result = RecoveryResult {
            entries_recovered: entries.len() as u64,
            last_lsn: entries.last().map_or(0, |entry| entry.lsn),
            ..RecoveryResult::default()
        };

        match reader.stop_reason() {
            Some(Stop::Truncated) => {
                tracing::warn!(
                    offset = reader.position(),
                    "command log ends in a partial frame"
                );
                result.was_truncated = true;
            }
            Some(Stop::Corrupted(reason)) => {
                tracing::warn!(offset = reader.position(), %reason, "corrupted command log frame");
                result.entries_corrupted = 1;
                result.was_truncated = true;
            }
            None => {}
        }

        Ok((entries, result, reader.position()))
    }
}
