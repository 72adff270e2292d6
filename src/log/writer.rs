//! Command log writer
//!
//! Handles appending entries to the log file and rewriting it in place.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::entry::{encode_frame, Operation};
use super::reader::LogReader;
use crate::config::LogSyncStrategy;
use crate::error::Result;

/// Appends entries to the command log
pub struct LogWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN the next appended entry receives
    next_lsn: u64,
    sync_strategy: LogSyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
    /// Bytes in the log file
    len: u64,
    /// File length before the most recent append
    last_append: Option<u64>,
}

impl LogWriter {
    /// Open or create a log file, continuing after its last valid entry
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let last_lsn = LogReader::open(path)?.last().map_or(0, |entry| entry.lsn);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            next_lsn: last_lsn + 1,
            sync_strategy,
            unsynced: 0,
            len,
            last_append: None,
        })
    }

    /// Append an operation, returning the LSN it was logged under
    pub fn append(&mut self, operation: &Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = encode_frame(lsn, operation)?;
        self.writer.write_all(&frame)?;
        self.last_append = Some(self.len);
        self.len += frame.len() as u64;
        self.next_lsn += 1;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            LogSyncStrategy::EveryWrite => true,
            LogSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        } else {
            self.writer.flush()?;
        }

        Ok(lsn)
    }

    /// Remove the most recent append, e.g. when its operation failed to apply
    ///
    /// Returns whether an entry was removed. Only the latest append can be
    /// discarded, and only once.
    pub fn discard_last(&mut self) -> Result<bool> {
        let Some(offset) = self.last_append.take() else {
            return Ok(false);
        };

        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(offset)?;
        file.sync_data()?;
        self.len = offset;
        self.next_lsn -= 1;
        self.unsynced = self.unsynced.saturating_sub(1);

        tracing::debug!(lsn = self.next_lsn, "discarded last log entry");
        Ok(true)
    }

    /// Force everything written so far onto disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Discard every entry and restart numbering at 1
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_ref();
        file.set_len(0)?;
        file.sync_all()?;
        self.next_lsn = 1;
        self.unsynced = 0;
        self.len = 0;
        self.last_append = None;
        Ok(())
    }

    /// Replace the whole log with `operations`
    ///
    /// The new log is written beside the old one and renamed over it, so a
    /// crash mid-rewrite leaves the old log intact.
    pub fn rewrite<I>(&mut self, operations: I) -> Result<u64>
    where
        I: IntoIterator<Item = Operation>,
    {
        let temp_path = self.path.with_extension("rewrite");
        let written = match write_temp(&temp_path, operations) {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    tracing::warn!(path = %temp_path.display(), error = %cleanup, "failed to remove partial log rewrite");
                }
                return Err(e);
            }
        };

        self.writer.flush()?;
        fs::rename(&temp_path, &self.path)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.len = file.metadata()?.len();
        self.writer = BufWriter::new(file);
        self.next_lsn = written + 1;
        self.unsynced = 0;
        self.last_append = None;

        tracing::debug!(entries = written, path = %self.path.display(), "command log rewritten");
        Ok(written)
    }

    /// LSN the next appended entry receives
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn
    }

    /// Entries written since the last fsync
    pub fn unsynced_count(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `operations` as a fresh log at `path`, numbering from 1
fn write_temp<I>(path: &Path, operations: I) -> Result<u64>
where
    I: IntoIterator<Item = Operation>,
{
    let mut temp = BufWriter::new(File::create(path)?);
    let mut written = 0;
    for operation in operations {
        written += 1;
        temp.write_all(&encode_frame(written, &operation)?)?;
    }
    temp.flush()?;
    temp.get_ref().sync_all()?;
    Ok(written)
}
