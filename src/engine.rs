//! Engine Module
//!
//! Hosts grids under byte-string keys and makes them durable.
//!
//! ## Responsibilities
//! - Route parsed commands to grid operations
//! - Validate every mutation before it is logged
//! - Append each successful mutation to the command log
//! - Snapshot the keyspace and truncate the log on `save`
//! - Rebuild the keyspace from snapshot + log on startup

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{Axis, GridError, Result};
use crate::grid::{CellRange, Grid, StorageBackend};
use crate::log::{LogRecovery, LogWriter, Operation};
use crate::persistence::{self, accounting, SnapshotFile};
use crate::protocol::{Command, Reply};

/// What a key can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Grid(Grid),
    /// Plain bytes stored with `SET`
    Text(Vec<u8>),
}

/// The keyspace engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** take the keyspace write lock for the whole command, so
///   validation, logging and the mutation itself happen as one step.
///   Lock order is always keyspace → log.
/// - **Reads** share the keyspace read lock.
/// - `save` and `rewrite_log` hold the read lock, which keeps writers out
///   while the snapshot and the log are brought in line.
pub struct Engine {
    config: Config,

    keyspace: RwLock<HashMap<Vec<u8>, Value>>,

    /// Command log (exclusive access needed)
    log: Mutex<LogWriter>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const LOG_FILENAME: &'static str = "commands.log";
    const SNAPSHOT_FILENAME: &'static str = "grids.snap";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Load the keyspace snapshot if one exists
    /// 3. Replay the valid prefix of the command log on top of it
    /// 4. Optionally compact the log to one record per key
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let snapshot_path = config.data_dir.join(Self::SNAPSHOT_FILENAME);
        let log_path = config.data_dir.join(Self::LOG_FILENAME);
        let backend = config.default_backend;

        let mut keyspace = HashMap::new();
        if snapshot_path.exists() {
            for entry in SnapshotFile::read(&snapshot_path, backend)? {
                keyspace.insert(entry.key, entry.value);
            }
            tracing::info!(keys = keyspace.len(), "snapshot loaded");
        }

        let (entries, recovery) = LogRecovery::recover(&log_path)?;
        let mut skipped = 0u64;
        for entry in &entries {
            if let Err(e) = apply(&mut keyspace, &entry.operation, backend) {
                tracing::warn!(lsn = entry.lsn, error = %e, "skipping unreplayable log entry");
                skipped += 1;
            }
        }
        if recovery.entries_recovered > 0 || recovery.was_truncated {
            tracing::info!(
                replayed = recovery.entries_recovered - skipped,
                skipped,
                corrupted = recovery.entries_corrupted,
                last_lsn = recovery.last_lsn,
                "command log replayed"
            );
        }

        let log = LogWriter::open(&log_path, config.log_sync_strategy)?;
        let engine = Self {
            config,
            keyspace: RwLock::new(keyspace),
            log: Mutex::new(log),
        };

        if engine.config.rewrite_log_on_open && !entries.is_empty() {
            engine.rewrite_log()?;
        }

        Ok(engine)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Execute a command
    pub fn execute(&self, command: Command) -> Result<Reply> {
        tracing::debug!(?command, "execute");
        let reply = match command {
            Command::Dimension {
                key,
                rows,
                columns,
                values,
            } => {
                self.dim(&key, rows, columns, values)?;
                Reply::Ok
            }
            Command::SetRange {
                key,
                row_start,
                row_end,
                column_start,
                column_end,
                values,
            } => {
                self.set_range(&key, row_start, row_end, column_start, column_end, values)?;
                Reply::Ok
            }
            Command::Range {
                key,
                row_start,
                row_end,
                column_start,
                column_end,
            } => Reply::Cells(self.range(&key, row_start, row_end, column_start, column_end)?),
            Command::Shape { key } => {
                let (rows, columns) = self.shape(&key)?;
                Reply::Shape { rows, columns }
            }
            Command::Dump { key } => {
                let (rows, columns, cells) = self.dump(&key)?;
                Reply::Dump {
                    rows,
                    columns,
                    cells,
                }
            }
            Command::Memory { key } => Reply::Integer(self.memory_usage(&key)? as u64),
            Command::Digest { key } => Reply::Integer(u64::from(self.digest(&key)?)),
            Command::Get { key } => match self.get(&key)? {
                Some(value) => Reply::Text(value),
                None => Reply::Nil,
            },
            Command::Put { key, value } => {
                self.put(&key, &value)?;
                Reply::Ok
            }
            Command::Delete { key } => Reply::Integer(u64::from(self.delete(&key)?)),
            Command::Ping => Reply::Pong,
            Command::Save => {
                self.save()?;
                Reply::Ok
            }
            Command::Rewrite => {
                self.rewrite_log()?;
                Reply::Ok
            }
        };
        Ok(reply)
    }

    // =========================================================================
    // Grid Commands
    // =========================================================================

    /// Create, resize, or resize-and-replace the grid under `key`
    ///
    /// With `values` the grid is rebuilt from them row-major; without, the
    /// overlapping cells are kept. A zero dimension removes the grid.
    pub fn dim(&self, key: &[u8], rows: i64, columns: i64, values: Option<Vec<String>>) -> Result<()> {
        let (rows, columns) = self.check_dimensions(rows, columns)?;
        if let Some(values) = &values {
            let expected = rows * columns;
            if values.len() != expected {
                return Err(GridError::ArgumentCountMismatch {
                    expected,
                    actual: values.len(),
                });
            }
        }

        let mut keyspace = self.keyspace.write();
        match keyspace.get(key) {
            Some(Value::Text(_)) => return Err(GridError::WrongStoredType),
            None if rows == 0 || columns == 0 => return Ok(()),
            _ => {}
        }

        let operation = Operation::Dimension {
            key: key.to_vec(),
            rows: rows as u64,
            columns: columns as u64,
            values,
        };
        self.commit(&mut keyspace, &operation)
    }

    /// Overwrite a rectangle of an existing grid
    ///
    /// Indices may be negative (counted from the end) and either end of an
    /// axis may come first. Values are taken row-major in visiting order.
    pub fn set_range(
        &self,
        key: &[u8],
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
        values: Vec<String>,
    ) -> Result<()> {
        let mut keyspace = self.keyspace.write();
        let grid = grid_of(keyspace.get(key))?;
        let range = CellRange::resolve(
            row_start,
            row_end,
            column_start,
            column_end,
            grid.rows(),
            grid.columns(),
        )?;
        if values.len() != range.len() {
            return Err(GridError::ArgumentCountMismatch {
                expected: range.len(),
                actual: values.len(),
            });
        }

        let operation = Operation::SetRange {
            key: key.to_vec(),
            row_start,
            row_end,
            column_start,
            column_end,
            values,
        };
        self.commit(&mut keyspace, &operation)
    }

    /// Read a rectangle, row-major in visiting order
    pub fn range(
        &self,
        key: &[u8],
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
    ) -> Result<Vec<Option<String>>> {
        self.with_grid(key, |grid| {
            let range = CellRange::resolve(
                row_start,
                row_end,
                column_start,
                column_end,
                grid.rows(),
                grid.columns(),
            )?;
            let cells = grid.read_range(&range)?;
            Ok(cells.into_iter().map(|cell| cell.map(str::to_owned)).collect())
        })
    }

    pub fn shape(&self, key: &[u8]) -> Result<(usize, usize)> {
        self.with_grid(key, |grid| Ok(grid.shape()))
    }

    /// Shape and every cell, row-major
    pub fn dump(&self, key: &[u8]) -> Result<(usize, usize, Vec<Option<String>>)> {
        self.with_grid(key, |grid| Ok((grid.rows(), grid.columns(), grid.to_row_major())))
    }

    /// Approximate bytes held by the grid under `key`
    pub fn memory_usage(&self, key: &[u8]) -> Result<usize> {
        self.with_grid(key, |grid| Ok(persistence::memory_footprint(grid)))
    }

    /// Content digest of the grid under `key`; independent of backend
    pub fn digest(&self, key: &[u8]) -> Result<u32> {
        self.with_grid(key, |grid| Ok(accounting::checksum(grid)))
    }

    // =========================================================================
    // Plain Values
    // =========================================================================

    /// Get a plain value; a grid under `key` is `WrongStoredType`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.keyspace.read().get(key) {
            None => Ok(None),
            Some(Value::Text(value)) => Ok(Some(value.clone())),
            Some(Value::Grid(_)) => Err(GridError::WrongStoredType),
        }
    }

    /// Store a plain value, replacing whatever `key` held
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut keyspace = self.keyspace.write();
        let operation = Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        self.commit(&mut keyspace, &operation)
    }

    /// Remove `key`, returning whether it existed
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut keyspace = self.keyspace.write();
        if !keyspace.contains_key(key) {
            return Ok(false);
        }

        let operation = Operation::Delete { key: key.to_vec() };
        self.commit(&mut keyspace, &operation)?;
        Ok(true)
    }

    // =========================================================================
    // Durability
    // =========================================================================

    /// Write the whole keyspace to the snapshot file and empty the log
    pub fn save(&self) -> Result<()> {
        let keyspace = self.keyspace.read();
        let written = SnapshotFile::write(
            &self.snapshot_path(),
            keyspace.iter().map(|(key, value)| (key.as_slice(), value)),
        )?;
        self.log.lock().truncate()?;

        tracing::info!(keys = written, "keyspace saved");
        Ok(())
    }

    /// Replace the command log with a compact set of records per key
    ///
    /// The rewritten log describes the whole keyspace, so any snapshot it
    /// was replayed on top of is removed afterwards.
    pub fn rewrite_log(&self) -> Result<u64> {
        let keyspace = self.keyspace.read();
        let max_record_bytes = self.config.max_log_record_bytes;
        let operations = keyspace.iter().flat_map(|(key, value)| match value {
            Value::Grid(grid) => persistence::rewrite_operations(key, grid, max_record_bytes),
            Value::Text(text) => vec![Operation::Put {
                key: key.clone(),
                value: text.clone(),
            }],
        });
        let written = self.log.lock().rewrite(operations)?;

        let snapshot_path = self.snapshot_path();
        if snapshot_path.exists() {
            fs::remove_file(&snapshot_path)?;
            tracing::debug!(path = %snapshot_path.display(), "snapshot superseded by rewritten log");
        }

        tracing::info!(records = written, "command log compacted");
        Ok(written)
    }

    /// Close the engine gracefully
    ///
    /// Syncs the command log; call `save` first to also write a snapshot.
    pub fn close(self) -> Result<()> {
        self.log.lock().sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::SNAPSHOT_FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.data_dir.join(Self::LOG_FILENAME)
    }

    /// LSN the next logged mutation receives
    pub fn current_lsn(&self) -> u64 {
        self.log.lock().current_lsn()
    }

    /// Number of keys of any kind
    pub fn key_count(&self) -> usize {
        self.keyspace.read().len()
    }

    pub fn backend(&self) -> StorageBackend {
        self.config.default_backend
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn check_dimensions(&self, rows: i64, columns: i64) -> Result<(usize, usize)> {
        if rows < 0 {
            return Err(GridError::NegativeDimension(Axis::Row));
        }
        if columns < 0 {
            return Err(GridError::NegativeDimension(Axis::Column));
        }

        let (rows, columns) = (rows as u64, columns as u64);
        match rows.checked_mul(columns) {
            Some(cells) if cells <= self.config.max_cells as u64 => {
                Ok((rows as usize, columns as usize))
            }
            _ => Err(GridError::GridTooLarge { rows, columns }),
        }
    }

    /// Log `operation`, then apply it; a failed apply takes the entry back out
    ///
    /// The caller holds the keyspace write lock, so nothing else can append
    /// between the two steps.
    fn commit(&self, keyspace: &mut HashMap<Vec<u8>, Value>, operation: &Operation) -> Result<()> {
        let mut log = self.log.lock();
        log.append(operation)?;
        if let Err(e) = apply(keyspace, operation, self.config.default_backend) {
            tracing::warn!(key = %String::from_utf8_lossy(operation.key()), error = %e, "operation failed to apply; discarding its log entry");
            log.discard_last()?;
            return Err(e);
        }
        Ok(())
    }

    fn with_grid<T>(&self, key: &[u8], f: impl FnOnce(&Grid) -> Result<T>) -> Result<T> {
        let keyspace = self.keyspace.read();
        f(grid_of(keyspace.get(key))?)
    }
}

fn grid_of(value: Option<&Value>) -> Result<&Grid> {
    match value {
        None => Err(GridError::EmptyTarget),
        Some(Value::Grid(grid)) => Ok(grid),
        Some(Value::Text(_)) => Err(GridError::WrongStoredType),
    }
}

fn to_usize(rows: u64, columns: u64) -> Result<(usize, usize)> {
    match (usize::try_from(rows), usize::try_from(columns)) {
        (Ok(rows), Ok(columns)) => Ok((rows, columns)),
        _ => Err(GridError::GridTooLarge { rows, columns }),
    }
}

/// Apply one logged operation to the keyspace
///
/// Shared by live commands (after validation and logging) and by replay.
/// A failed `Dimension` leaves the keyspace unchanged; a failed `SetRange`
/// may have written some of its cells.
fn apply(
    keyspace: &mut HashMap<Vec<u8>, Value>,
    operation: &Operation,
    backend: StorageBackend,
) -> Result<()> {
    match operation {
        Operation::Dimension {
            key,
            rows,
            columns,
            values,
        } => {
            let (rows, columns) = to_usize(*rows, *columns)?;
            if rows == 0 || columns == 0 {
                if let Some(Value::Text(_)) = keyspace.get(key) {
                    return Err(GridError::WrongStoredType);
                }
                if keyspace.remove(key).is_some() {
                    tracing::debug!(key = %String::from_utf8_lossy(key), "grid removed by zero dimension");
                }
                return Ok(());
            }

            match keyspace.get_mut(key) {
                Some(Value::Grid(grid)) => match values {
                    Some(values) => grid.resize_replace(rows, columns, values),
                    None => grid.resize_preserve(rows, columns),
                },
                Some(Value::Text(_)) => Err(GridError::WrongStoredType),
                None => {
                    let grid = Grid::create(backend, rows, columns, values.as_ref())?;
                    keyspace.insert(key.clone(), Value::Grid(grid));
                    Ok(())
                }
            }
        }
        Operation::SetRange {
            key,
            row_start,
            row_end,
            column_start,
            column_end,
            values,
        } => {
            let grid = match keyspace.get_mut(key) {
                Some(Value::Grid(grid)) => grid,
                Some(Value::Text(_)) => return Err(GridError::WrongStoredType),
                None => return Err(GridError::EmptyTarget),
            };
            let range = CellRange::resolve(
                *row_start,
                *row_end,
                *column_start,
                *column_end,
                grid.rows(),
                grid.columns(),
            )?;
            if values.len() != range.len() {
                return Err(GridError::ArgumentCountMismatch {
                    expected: range.len(),
                    actual: values.len(),
                });
            }
            grid.set_range(&range, values)
        }
        Operation::Put { key, value } => {
            keyspace.insert(key.clone(), Value::Text(value.clone()));
            Ok(())
        }
        Operation::Delete { key } => {
            keyspace.remove(key);
            Ok(())
        }
    }
}
