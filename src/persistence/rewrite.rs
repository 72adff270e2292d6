//! Log-replay re-emission
//!
//! A grid is re-emitted as a single `Dimension` operation carrying its full
//! shape and every cell row-major. Replaying that one operation against an
//! absent key rebuilds the grid exactly.
//!
//! A grid whose single record would not fit in one log frame is instead
//! emitted as `Delete`, a value-less `Dimension`, and `SetRange` records over
//! row bands. Bands that hold only absent cells are skipped, since a freshly
//! dimensioned grid is already empty.

use crate::grid::Grid;
use crate::log::Operation;

/// Encoded size of one cell inside an operation (length prefix + bytes)
const CELL_OVERHEAD: usize = 8;

/// Room left in a record for its key and the fixed fields
const RECORD_OVERHEAD: usize = 64;

/// The one operation that recreates `grid` under `key`
///
/// Absent cells are emitted as empty strings, which replay back as absent.
pub fn rewrite_operation(key: &[u8], grid: &Grid) -> Operation {
    let values = grid
        .cells()
        .map(|cell| cell.clone().unwrap_or_default())
        .collect();

    Operation::Dimension {
        key: key.to_vec(),
        rows: grid.rows() as u64,
        columns: grid.columns() as u64,
        values: Some(values),
    }
}

/// Operations that recreate `grid` under `key`, none larger than `max_record_bytes`
///
/// Yields the single record of [`rewrite_operation`] whenever it fits.
pub fn rewrite_operations(key: &[u8], grid: &Grid, max_record_bytes: usize) -> Vec<Operation> {
    let budget = max_record_bytes.saturating_sub(RECORD_OVERHEAD + key.len());
    let cost = |cell: Option<&str>| CELL_OVERHEAD + cell.map_or(0, str::len);

    let total: usize = grid.cells().map(|cell| cost(cell.as_deref())).sum();
    if total <= budget {
        return vec![rewrite_operation(key, grid)];
    }

    let mut operations = vec![
        Operation::Delete { key: key.to_vec() },
        Operation::Dimension {
            key: key.to_vec(),
            rows: grid.rows() as u64,
            columns: grid.columns() as u64,
            values: None,
        },
    ];
    let mut band = Band::new(key);

    for row in 0..grid.rows() {
        let cells: Vec<Option<&str>> = (0..grid.columns()).map(|column| grid.cell(row, column)).collect();
        if cells.iter().all(Option::is_none) {
            band.flush(&mut operations, grid.columns());
            continue;
        }

        let row_cost: usize = cells.iter().map(|cell| cost(*cell)).sum();
        if row_cost > budget {
            band.flush(&mut operations, grid.columns());
            split_row(key, row, &cells, budget, &cost, &mut operations);
            continue;
        }

        if band.bytes + row_cost > budget {
            band.flush(&mut operations, grid.columns());
        }
        band.push(row, &cells, row_cost);
    }
    band.flush(&mut operations, grid.columns());

    tracing::debug!(
        key = %String::from_utf8_lossy(key),
        records = operations.len(),
        "grid re-emitted in bands"
    );
    operations
}

/// Consecutive full rows waiting to become one `SetRange`
struct Band<'a> {
    key: &'a [u8],
    first_row: usize,
    rows: usize,
    values: Vec<String>,
    bytes: usize,
}

impl<'a> Band<'a> {
    fn new(key: &'a [u8]) -> Self {
        Self {
            key,
            first_row: 0,
            rows: 0,
            values: Vec::new(),
            bytes: 0,
        }
    }

    fn push(&mut self, row: usize, cells: &[Option<&str>], cost: usize) {
        if self.rows == 0 {
            self.first_row = row;
        }
        self.rows += 1;
        self.bytes += cost;
        self.values
            .extend(cells.iter().map(|cell| cell.unwrap_or_default().to_owned()));
    }

    fn flush(&mut self, operations: &mut Vec<Operation>, columns: usize) {
        if self.rows == 0 {
            return;
        }
        operations.push(Operation::SetRange {
            key: self.key.to_vec(),
            row_start: self.first_row as i64,
            row_end: (self.first_row + self.rows - 1) as i64,
            column_start: 0,
            column_end: columns as i64 - 1,
            values: std::mem::take(&mut self.values),
        });
        self.rows = 0;
        self.bytes = 0;
    }
}

/// Emit one row too large for a single record as column segments
fn split_row(
    key: &[u8],
    row: usize,
    cells: &[Option<&str>],
    budget: usize,
    cost: &impl Fn(Option<&str>) -> usize,
    operations: &mut Vec<Operation>,
) {
    let mut start = 0;
    while start < cells.len() {
        let mut end = start;
        let mut bytes = 0;
        // A lone cell over budget still gets its own record; the log reports it.
        while end < cells.len() && (end == start || bytes + cost(cells[end]) <= budget) {
            bytes += cost(cells[end]);
            end += 1;
        }

        if cells[start..end].iter().any(Option::is_some) {
            operations.push(Operation::SetRange {
                key: key.to_vec(),
                row_start: row as i64,
                row_end: row as i64,
                column_start: start as i64,
                column_end: end as i64 - 1,
                values: cells[start..end]
                    .iter()
                    .map(|cell| cell.unwrap_or_default().to_owned())
                    .collect(),
            });
        }
        start = end;
    }
}
