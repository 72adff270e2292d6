//! Cell values
//!
//! A cell is either absent or an owned, non-empty string. Every value
//! written into a grid is copied so the grid never borrows from its caller.

use crate::error::{GridError, Result};

/// One grid slot
pub type Cell = Option<String>;

/// Anything a cell can be initialized from
///
/// `None` and the empty string both produce an absent cell.
pub trait CellSource {
    fn cell_text(&self) -> Option<&str>;
}

impl CellSource for str {
    fn cell_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl CellSource for String {
    fn cell_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl CellSource for Box<str> {
    fn cell_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: CellSource + ?Sized> CellSource for &T {
    fn cell_text(&self) -> Option<&str> {
        (**self).cell_text()
    }
}

impl<T: CellSource> CellSource for Option<T> {
    fn cell_text(&self) -> Option<&str> {
        self.as_ref().and_then(|v| v.cell_text())
    }
}

/// Make an owned cell from a source value
pub fn copy_cell<S: CellSource + ?Sized>(source: &S) -> Result<Cell> {
    match source.cell_text() {
        Some(text) if !text.is_empty() => {
            let mut owned = String::new();
            owned
                .try_reserve_exact(text.len())
                .map_err(|_| GridError::AllocationFailure)?;
            owned.push_str(text);
            Ok(Some(owned))
        }
        _ => Ok(None),
    }
}

/// Initialize an empty slot from `source`
///
/// On failure the slot is left untouched.
pub fn set<S: CellSource + ?Sized>(source: &S, cell: &mut Cell) -> Result<()> {
    *cell = copy_cell(source)?;
    Ok(())
}

/// Release whatever `cell` holds, then initialize it from `source`
///
/// On failure the slot is left absent.
pub fn reset<S: CellSource + ?Sized>(source: &S, cell: &mut Cell) -> Result<()> {
    *cell = None;
    set(source, cell)
}

/// Release every value in `cells`, leaving each one absent
pub fn clear_range(cells: &mut [Cell]) {
    for cell in cells {
        *cell = None;
    }
}

/// Allocate `len` absent cells, reporting allocation failure instead of aborting
pub(crate) fn alloc_cells(len: usize) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    cells.try_reserve_exact(len)?;
    cells.resize_with(len, || None);
    Ok(cells)
}

/// Allocate `len` cells filled from `source`, row-major
///
/// Either every cell is filled or nothing is kept: on failure the partially
/// built buffer is dropped, releasing every copy made so far.
pub(crate) fn alloc_cells_from<I, S>(len: usize, source: &mut I) -> Result<Vec<Cell>>
where
    I: Iterator<Item = S>,
    S: CellSource,
{
    let mut cells = Vec::new();
    cells.try_reserve_exact(len)?;
    for filled in 0..len {
        let value = source.next().ok_or(GridError::ArgumentCountMismatch {
            expected: len,
            actual: filled,
        })?;
        cells.push(copy_cell(&value)?);
    }
    Ok(cells)
}
