//! Flat grid storage
//!
//! All cells live in one contiguous buffer addressed by `row * columns + column`.

use std::mem;

use super::cell::{self, Cell, CellSource};
use super::{checked_len, CellRange, GridStore, StorageBackend};
use crate::error::{GridError, Result};

/// A grid whose cells share a single allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatGrid {
    rows: usize,
    columns: usize,
    /// `rows * columns` cells, row-major
    cells: Vec<Cell>,
}

impl FlatGrid {
    fn offset(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// The whole cell buffer, row-major
    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }
}

impl GridStore for FlatGrid {
    const BACKEND: StorageBackend = StorageBackend::Flat;

    fn create<I, S>(rows: usize, columns: usize, source: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        let len = checked_len(rows, columns)?;
        let cells = match source {
            Some(source) => cell::alloc_cells_from(len, &mut source.into_iter())?,
            None => cell::alloc_cells(len)?,
        };

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    fn from_row_major(rows: usize, columns: usize, cells: Vec<Cell>) -> Result<Self> {
        let len = checked_len(rows, columns)?;
        if cells.len() != len {
            return Err(GridError::ArgumentCountMismatch {
                expected: len,
                actual: cells.len(),
            });
        }

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.cells[self.offset(row, column)].as_deref()
    }

    fn cell_slot_mut(&mut self, row: usize, column: usize) -> &mut Cell {
        let offset = self.offset(row, column);
        &mut self.cells[offset]
    }

    fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    fn handle_overhead(&self) -> usize {
        self.cells.len() * mem::size_of::<Cell>()
    }

    fn resize_preserve(&mut self, rows: usize, columns: usize) -> Result<()> {
        if rows == self.rows && columns == self.columns {
            return Ok(());
        }

        // Allocate before touching the old buffer so a failure changes nothing
        let len = checked_len(rows, columns)?;
        let mut cells: Vec<Cell> = Vec::new();
        cells.try_reserve_exact(len)?;

        let (old_rows, old_columns) = (self.rows, self.columns);
        let min_rows = old_rows.min(rows);
        let min_columns = old_columns.min(columns);
        let mut old = mem::take(&mut self.cells);

        // Release rows that no longer exist
        if rows < old_rows {
            cell::clear_range(&mut old[rows * old_columns..]);
        }

        // Release the trimmed tail of every surviving row
        if columns < old_columns {
            for row in old.chunks_exact_mut(old_columns).take(min_rows) {
                cell::clear_range(&mut row[columns..]);
            }
        }

        // Move the overlap across; the text itself is not copied
        for row in old.chunks_exact_mut(old_columns).take(min_rows) {
            cells.extend(row[..min_columns].iter_mut().map(Option::take));
            cells.resize_with(cells.len() + (columns - min_columns), || None);
        }

        // New rows start absent
        cells.resize_with(len, || None);

        tracing::trace!(
            old_rows,
            old_columns,
            rows,
            columns,
            "flat grid resized preserving overlap"
        );

        self.rows = rows;
        self.columns = columns;
        self.cells = cells;
        Ok(())
    }

    fn resize_replace<I, S>(&mut self, rows: usize, columns: usize, source: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        if rows == self.rows && columns == self.columns {
            return self.set_range(&CellRange::full(rows, columns), source);
        }

        let replacement = Self::create(rows, columns, Some(source))?;
        tracing::trace!(rows, columns, "flat grid replaced");
        *self = replacement;
        Ok(())
    }
}
