//! Grid facade
//!
//! The one grid type the rest of the crate talks to. It wraps whichever
//! backend was chosen at creation and forwards every call to it.

use super::cell::{Cell, CellSource};
use super::{CellRange, FlatGrid, GridStore, RowGrid, StorageBackend};
use crate::error::Result;

/// A grid on either storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grid {
    Flat(FlatGrid),
    RowWise(RowGrid),
}

macro_rules! dispatch {
    ($grid:expr, $store:ident => $body:expr) => {
        match $grid {
            Grid::Flat($store) => $body,
            Grid::RowWise($store) => $body,
        }
    };
}

impl Grid {
    /// Allocate a grid on `backend`, optionally filled row-major from `source`
    ///
    /// Nothing is left allocated if any value fails to copy.
    pub fn create<I, S>(
        backend: StorageBackend,
        rows: usize,
        columns: usize,
        source: Option<I>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        let grid = match backend {
            StorageBackend::Flat => Grid::Flat(FlatGrid::create(rows, columns, source)?),
            StorageBackend::RowWise => Grid::RowWise(RowGrid::create(rows, columns, source)?),
        };
        tracing::trace!(%backend, rows, columns, "grid created");
        Ok(grid)
    }

    /// Allocate a grid with every cell absent
    pub fn empty(backend: StorageBackend, rows: usize, columns: usize) -> Result<Self> {
        Self::create(backend, rows, columns, None::<Vec<&str>>)
    }

    /// Build a grid around cells that are already laid out row-major
    pub fn from_row_major(
        backend: StorageBackend,
        rows: usize,
        columns: usize,
        cells: Vec<Cell>,
    ) -> Result<Self> {
        Ok(match backend {
            StorageBackend::Flat => Grid::Flat(FlatGrid::from_row_major(rows, columns, cells)?),
            StorageBackend::RowWise => {
                Grid::RowWise(RowGrid::from_row_major(rows, columns, cells)?)
            }
        })
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            Grid::Flat(_) => FlatGrid::BACKEND,
            Grid::RowWise(_) => RowGrid::BACKEND,
        }
    }

    pub fn rows(&self) -> usize {
        dispatch!(self, g => g.rows())
    }

    pub fn columns(&self) -> usize {
        dispatch!(self, g => g.columns())
    }

    pub fn shape(&self) -> (usize, usize) {
        dispatch!(self, g => g.shape())
    }

    /// Number of cells (`rows * columns`)
    pub fn len(&self) -> usize {
        self.rows() * self.columns()
    }

    /// Live grids always have at least one cell
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        dispatch!(self, g => g.cell(row, column))
    }

    /// Every cell, row-major
    pub fn cells(&self) -> Box<dyn Iterator<Item = &Cell> + '_> {
        let cells: Box<dyn Iterator<Item = &Cell> + '_> = match self {
            Grid::Flat(g) => Box::new(g.cells()),
            Grid::RowWise(g) => Box::new(g.cells()),
        };
        cells
    }

    /// Overwrite a rectangle; see [`GridStore::set_range`] for the partial-failure rule
    pub fn set_range<I, S>(&mut self, range: &CellRange, source: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        dispatch!(self, g => g.set_range(range, source))
    }

    pub fn read_range(&self, range: &CellRange) -> Result<Vec<Option<&str>>> {
        dispatch!(self, g => g.read_range(range))
    }

    pub fn resize_preserve(&mut self, rows: usize, columns: usize) -> Result<()> {
        dispatch!(self, g => g.resize_preserve(rows, columns))
    }

    pub fn resize_replace<I, S>(&mut self, rows: usize, columns: usize, source: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: CellSource,
    {
        dispatch!(self, g => g.resize_replace(rows, columns, source))
    }

    /// Row-major copy of every cell
    pub fn to_row_major(&self) -> Vec<Option<String>> {
        self.cells().cloned().collect()
    }
}

impl From<FlatGrid> for Grid {
    fn from(grid: FlatGrid) -> Self {
        Grid::Flat(grid)
    }
}

impl From<RowGrid> for Grid {
    fn from(grid: RowGrid) -> Self {
        Grid::RowWise(grid)
    }
}
