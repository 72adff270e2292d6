//! Grid Module
//!
//! Resizable two-dimensional grids of optional text cells.
//!
//! ## Responsibilities
//! - Own every cell's text (cells are never shared between grids)
//! - Read and overwrite inclusive, direction-aware rectangles
//! - Resize while keeping the overlapping content, or resize and replace
//!
//! ## Storage Backends
//! Two interchangeable layouts implement [`GridStore`]:
//! ```text
//!   Flat                               RowWise
//!   ┌────┬────┬────┬────┬────┬────┐    ┌───┐   ┌────┬────┬────┐
//!   │0,0 │0,1 │0,2 │1,0 │1,1 │1,2 │    │ 0 │──►│0,0 │0,1 │0,2 │
//!   └────┴────┴────┴────┴────┴────┘    ├───┤   └────┴────┴────┘
//!   one buffer, row * columns + col    │ 1 │──►│1,0 │1,1 │1,2 │
//!                                      └───┘   └────┴────┴────┘
//! ```
//! Every operation yields the same observable result on either layout;
//! only the reallocation cost of a resize differs. [`Grid`] picks one at
//! creation and keeps it for the grid's lifetime.

pub mod cell;
pub mod range;
mod flat;
mod row;
mod facade;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

pub use cell::{Cell, CellSource};
pub use range::{AxisSpan, CellRange};
pub use flat::FlatGrid;
pub use row::RowGrid;
pub use facade::Grid;

/// Physical layout of a grid's cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    /// One contiguous buffer addressed by `row * columns + column`
    #[default]
    Flat,

    /// One independently allocated buffer per row
    RowWise,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Flat => f.write_str("flat"),
            StorageBackend::RowWise => f.write_str("row-wise"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "array" => Ok(StorageBackend::Flat),
            "row-wise" | "rowwise" | "row" => Ok(StorageBackend::RowWise),
            other => Err(GridError::Config(format!("unknown storage backend '{}'", other))),
        }
    }
}

/// Storage contract shared by both backends
///
/// `set_range` and `read_range` are written once here on top of the
/// per-cell accessors, so both layouts traverse rectangles identically.
pub trait GridStore: Sized {
    /// Which layout this is
    const BACKEND: StorageBackend;

    /// Allocate a `rows` x `columns` grid
    ///
    /// With a source, cells are filled row-major from it; without one every
    /// cell starts absent. Either the whole grid is built or nothing is kept.
    fn create<I, S>(rows: usize, columns: usize, source: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: CellSource;

    /// Take ownership of already-built cells laid out row-major
    fn from_row_major(rows: usize, columns: usize, cells: Vec<Cell>) -> Result<Self>;

    fn rows(&self) -> usize;

    fn columns(&self) -> usize;

    /// Text of one cell, `None` when absent
    fn cell(&self, row: usize, column: usize) -> Option<&str>;

    fn cell_slot_mut(&mut self, row: usize, column: usize) -> &mut Cell;

    /// Every cell, row-major
    fn cells(&self) -> impl Iterator<Item = &Cell> + '_;

    /// Bytes spent on cell handles and row bookkeeping
    fn handle_overhead(&self) -> usize;

    /// Reshape, keeping the overlapping top-left rectangle
    ///
    /// Cells outside the overlap are released; new cells start absent.
    fn resize_preserve(&mut self, rows: usize, columns: usize) -> Result<()>;

    /// Reshape and refill every cell from `source`
    ///
    /// With unchanged dimensions this is `set_range` over the whole grid.
    /// Otherwise the new storage is built completely before the old one is
    /// released, so a failure leaves the grid as it was.
    fn resize_replace<I, S>(&mut self, rows: usize, columns: usize, source: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: CellSource;

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.columns())
    }

    /// Overwrite a rectangle, consuming one source value per cell
    ///
    /// Not atomic: if a value cannot be copied, or the source runs dry, the
    /// cells already visited keep their new values.
    fn set_range<I, S>(&mut self, range: &CellRange, source: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        range.check_bounds(self.rows(), self.columns())?;

        let expected = range.len();
        let mut source = source.into_iter();
        for (written, (row, column)) in range.positions().enumerate() {
            let value = source.next().ok_or(GridError::ArgumentCountMismatch {
                expected,
                actual: written,
            })?;
            cell::reset(&value, self.cell_slot_mut(row, column))?;
        }
        Ok(())
    }

    /// Read a rectangle in the same order `set_range` writes it
    fn read_range(&self, range: &CellRange) -> Result<Vec<Option<&str>>> {
        range.check_bounds(self.rows(), self.columns())?;

        let mut values = Vec::new();
        values.try_reserve_exact(range.len())?;
        values.extend(range.positions().map(|(row, column)| self.cell(row, column)));
        Ok(values)
    }
}

/// Number of cells in a `rows` x `columns` grid
///
/// Zero-sized grids are never live, and the product must fit in `usize`.
pub(crate) fn checked_len(rows: usize, columns: usize) -> Result<usize> {
    if rows == 0 || columns == 0 {
        return Err(GridError::ZeroDimension);
    }
    rows.checked_mul(columns).ok_or(GridError::GridTooLarge {
        rows: rows as u64,
        columns: columns as u64,
    })
}
