//! Row-wise grid storage
//!
//! Each row owns its own buffer, so changing the column count reallocates
//! rows independently and changing the row count never touches surviving rows.

use std::mem;

use super::cell::{self, Cell, CellSource};
use super::{checked_len, CellRange, GridStore, StorageBackend};
use crate::error::{GridError, Result};

/// A grid stored as one buffer per row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGrid {
    rows: usize,
    columns: usize,
    /// `rows` buffers of `columns` cells each
    lines: Vec<Vec<Cell>>,
}

impl RowGrid {
    /// Cells of one row
    pub fn row(&self, row: usize) -> &[Cell] {
        &self.lines[row]
    }

    fn alloc_lines(rows: usize) -> Result<Vec<Vec<Cell>>> {
        let mut lines = Vec::new();
        lines.try_reserve_exact(rows)?;
        Ok(lines)
    }
}

impl GridStore for RowGrid {
    const BACKEND: StorageBackend = StorageBackend::RowWise;

    fn create<I, S>(rows: usize, columns: usize, source: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        let len = checked_len(rows, columns)?;
        let mut lines = Self::alloc_lines(rows)?;
        let mut source = source.map(IntoIterator::into_iter);

        // Rows already built are dropped with `lines` if a later one fails
        for row in 0..rows {
            let line = match source.as_mut() {
                Some(source) => cell::alloc_cells_from(columns, source).map_err(|e| match e {
                    GridError::ArgumentCountMismatch { actual, .. } => {
                        GridError::ArgumentCountMismatch {
                            expected: len,
                            actual: row * columns + actual,
                        }
                    }
                    other => other,
                })?,
                None => cell::alloc_cells(columns)?,
            };
            lines.push(line);
        }

        Ok(Self {
            rows,
            columns,
            lines,
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

        let mut lines = Self::alloc_lines(rows)?;
        let mut cells = cells.into_iter();
        for _ in 0..rows {
            let mut line = Vec::new();
            line.try_reserve_exact(columns)?;
            line.extend(cells.by_ref().take(columns));
            lines.push(line);
        }

        Ok(Self {
            rows,
            columns,
            lines,
        })
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.columns
    }

    fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.lines[row][column].as_deref()
    }

    fn cell_slot_mut(&mut self, row: usize, column: usize) -> &mut Cell {
        &mut self.lines[row][column]
    }

    fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.lines.iter().flatten()
    }

    fn handle_overhead(&self) -> usize {
        self.lines.len() * mem::size_of::<Vec<Cell>>()
            + self.rows * self.columns * mem::size_of::<Cell>()
    }

    fn resize_preserve(&mut self, rows: usize, columns: usize) -> Result<()> {
        if rows == self.rows && columns == self.columns {
            return Ok(());
        }

        checked_len(rows, columns)?;
        let (old_rows, old_columns) = (self.rows, self.columns);
        let min_rows = old_rows.min(rows);

        // Reserve every allocation up front; past this point nothing can fail
        let mut added = Vec::new();
        if rows > old_rows {
            self.lines.try_reserve_exact(rows - old_rows)?;
            added.try_reserve_exact(rows - old_rows)?;
            for _ in old_rows..rows {
                added.push(cell::alloc_cells(columns)?);
            }
        }
        if columns > old_columns {
            for line in &mut self.lines[..min_rows] {
                line.try_reserve_exact(columns - old_columns)?;
            }
        }

        // Rows beyond the new height are cleared and freed
        for line in &mut self.lines[min_rows..] {
            cell::clear_range(line);
        }
        self.lines.truncate(min_rows);

        if columns < old_columns {
            for line in &mut self.lines {
                cell::clear_range(&mut line[columns..]);
                line.truncate(columns);
                line.shrink_to_fit();
            }
        } else if columns > old_columns {
            for line in &mut self.lines {
                line.resize_with(columns, || None);
            }
        }

        self.lines.extend(added);

        tracing::trace!(
            old_rows,
            old_columns,
            rows,
            columns,
            "row-wise grid resized preserving overlap"
        );

        self.rows = rows;
        self.columns = columns;
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
        tracing::trace!(rows, columns, "row-wise grid replaced");
        *self = replacement;
        Ok(())
    }
}
