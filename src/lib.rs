//! # GridKV
//!
//! A keyspace of resizable two-dimensional grids of optional text cells:
//! - Two interchangeable storage layouts (flat row-major and row-wise)
//! - Resize that keeps overlapping cells, or rebuilds from new values
//! - Rectangular reads and writes with negative and reversed indices
//! - Durable via a command log plus whole-keyspace snapshots
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Command::parse  (protocol)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │            (Single Writer / Multi Reader)                    │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐      ┌─────────────────┐     ┌─────────────────┐
//! │ Command Log │      │      Grid       │     │   Persistence   │
//! │  (Append)   │      │ Flat | RowWise  │     │ snapshot/digest │
//! └─────────────┘      └─────────────────┘     └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod grid;
pub mod persistence;
pub mod log;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GridError, Result};
pub use config::Config;
pub use engine::{Engine, Value};
pub use grid::{Grid, GridStore, StorageBackend};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GridKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
