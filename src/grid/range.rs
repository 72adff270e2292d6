//! Index resolution and inclusive range traversal
//!
//! Indices may be negative, counting back from the end of the axis
//! (`-1` is the last row or column). Ranges are inclusive at both ends and
//! may run backwards: rows 5 to 2 visits 5, 4, 3, 2.

use crate::error::{Axis, GridError, Result};

/// Parse a raw index argument
pub fn parse_index(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| GridError::NotAnInteger(what.to_string()))
}

/// Normalize a possibly-negative index against an axis of length `len`
pub fn resolve(raw: i64, len: usize, axis: Axis) -> Result<usize> {
    let out_of_bounds = || GridError::OutOfBounds {
        axis,
        index: raw,
        len,
    };

    let index = if raw < 0 {
        match usize::try_from(raw.unsigned_abs()) {
            Ok(back) if back <= len => len - back,
            _ => return Err(out_of_bounds()),
        }
    } else {
        usize::try_from(raw).map_err(|_| out_of_bounds())?
    };

    if index >= len {
        return Err(out_of_bounds());
    }
    Ok(index)
}

/// Step direction from `start` to `end`: `1` forwards, `-1` backwards
pub fn direction(start: usize, end: usize) -> isize {
    if start < end {
        1
    } else {
        -1
    }
}

/// Number of indices between `a` and `b`, both inclusive
pub fn span(a: usize, b: usize) -> usize {
    1 + a.abs_diff(b)
}

// =============================================================================
// Axis Span
// =============================================================================

/// An inclusive run of indices along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSpan {
    pub start: usize,
    pub end: usize,
}

impl AxisSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        span(self.start, self.end)
    }

    /// A span always holds at least one index
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate from `start` to `end` inclusive, in whichever direction that is
    pub fn iter(&self) -> AxisIter {
        AxisIter {
            next: Some(self.start),
            end: self.end,
            step: direction(self.start, self.end),
        }
    }

    fn max(&self) -> usize {
        self.start.max(self.end)
    }
}

/// Iterator over an [`AxisSpan`]
#[derive(Debug, Clone)]
pub struct AxisIter {
    next: Option<usize>,
    end: usize,
    step: isize,
}

impl Iterator for AxisIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = if current == self.end {
            None
        } else {
            current.checked_add_signed(self.step)
        };
        Some(current)
    }
}

// =============================================================================
// Cell Range
// =============================================================================

/// A rectangle of cells, traversed row-major in the direction of each span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub rows: AxisSpan,
    pub columns: AxisSpan,
}

impl CellRange {
    pub fn new(row_start: usize, row_end: usize, column_start: usize, column_end: usize) -> Self {
        Self {
            rows: AxisSpan::new(row_start, row_end),
            columns: AxisSpan::new(column_start, column_end),
        }
    }

    /// The whole of a `rows` x `columns` grid (both must be non-zero)
    pub fn full(rows: usize, columns: usize) -> Self {
        Self::new(0, rows.saturating_sub(1), 0, columns.saturating_sub(1))
    }

    /// Resolve four raw endpoints against a grid's shape
    pub fn resolve(
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
        rows: usize,
        columns: usize,
    ) -> Result<Self> {
        Ok(Self::new(
            resolve(row_start, rows, Axis::Row)?,
            resolve(row_end, rows, Axis::Row)?,
            resolve(column_start, columns, Axis::Column)?,
            resolve(column_end, columns, Axis::Column)?,
        ))
    }

    /// Number of cells in the rectangle
    pub fn len(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Fail with `OutOfBounds` unless the rectangle lies inside `rows` x `columns`
    pub fn check_bounds(&self, rows: usize, columns: usize) -> Result<()> {
        if self.rows.max() >= rows {
            return Err(GridError::OutOfBounds {
                axis: Axis::Row,
                index: self.rows.max() as i64,
                len: rows,
            });
        }
        if self.columns.max() >= columns {
            return Err(GridError::OutOfBounds {
                axis: Axis::Column,
                index: self.columns.max() as i64,
                len: columns,
            });
        }
        Ok(())
    }

    /// Every `(row, column)` position, row-major
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let columns = self.columns;
        self.rows
            .iter()
            .flat_map(move |r| columns.iter().map(move |c| (r, c)))
    }
}
