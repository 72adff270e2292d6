//! Configuration for GridKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::grid::StorageBackend;
use crate::log::MAX_PAYLOAD_SIZE;

/// Main configuration for a GridKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── grids.snap       (keyspace snapshot)
    ///     └── commands.log     (command log since the last snapshot)
    pub data_dir: PathBuf,

    /// Layout used for every grid created or loaded by this instance
    pub default_backend: StorageBackend,

    /// Largest `rows * columns` a single grid may have
    pub max_cells: usize,

    // -------------------------------------------------------------------------
    // Command Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the command log
    pub log_sync_strategy: LogSyncStrategy,

    /// Compact the command log into one record per key after replaying it
    pub rewrite_log_on_open: bool,

    /// Largest record a log rewrite emits; bigger grids are split into bands
    pub max_log_record_bytes: usize,
}

/// Command log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./gridkv_data"),
            default_backend: StorageBackend::Flat,
            max_cells: u32::MAX as usize,
            log_sync_strategy: LogSyncStrategy::EveryNEntries { count: 100 },
            rewrite_log_on_open: true,
            max_log_record_bytes: MAX_PAYLOAD_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the storage backend for new and loaded grids
    pub fn default_backend(mut self, backend: StorageBackend) -> Self {
        self.config.default_backend = backend;
        self
    }

    /// Set the maximum number of cells per grid
    pub fn max_cells(mut self, cells: usize) -> Self {
        self.config.max_cells = cells;
        self
    }

    /// Set the command log sync strategy
    pub fn log_sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync_strategy = strategy;
        self
    }

    /// Enable or disable log compaction on open
    pub fn rewrite_log_on_open(mut self, enabled: bool) -> Self {
        self.config.rewrite_log_on_open = enabled;
        self
    }

    /// Set the record size above which a rewritten grid is split
    pub fn max_log_record_bytes(mut self, bytes: usize) -> Self {
        self.config.max_log_record_bytes = bytes.min(MAX_PAYLOAD_SIZE);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
