//! Error types for GridKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GridError
pub type Result<T> = std::result::Result<T, GridError>;

/// Which grid axis an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Unified error type for GridKV operations
#[derive(Debug, Error)]
pub enum GridError {
    // -------------------------------------------------------------------------
    // Index / Argument Errors
    // -------------------------------------------------------------------------
    #[error("{0} must be an integer")]
    NotAnInteger(String),

    #[error("{axis} index {index} outside the bounds of the grid (length {len})")]
    OutOfBounds { axis: Axis, index: i64, len: usize },

    #[error("Invalid number of values: expected {expected}, got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },

    #[error("{0} must not be negative")]
    NegativeDimension(Axis),

    #[error("Grid too large: {rows} x {columns}")]
    GridTooLarge { rows: u64, columns: u64 },

    #[error("Grid dimensions must be greater than zero")]
    ZeroDimension,

    // -------------------------------------------------------------------------
    // Keyspace Errors
    // -------------------------------------------------------------------------
    #[error("Operation against a key holding the wrong kind of value")]
    WrongStoredType,

    #[error("Empty key")]
    EmptyTarget,

    // -------------------------------------------------------------------------
    // Memory Errors
    // -------------------------------------------------------------------------
    #[error("Failed to allocate grid storage")]
    AllocationFailure,

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported grid encoding version: {0}")]
    UnsupportedEncodingVersion(u32),

    #[error("Corrupted data: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Wrong number of arguments for '{0}'")]
    WrongArity(String),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::collections::TryReserveError> for GridError {
    fn from(_: std::collections::TryReserveError) -> Self {
        GridError::AllocationFailure
    }
}

impl From<bincode::Error> for GridError {
    fn from(e: bincode::Error) -> Self {
        GridError::Serialization(e.to_string())
    }
}
