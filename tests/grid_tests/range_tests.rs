//! Tests for index resolution and range traversal
//!
//! These tests verify:
//! - Negative indices count back from the end
//! - Out-of-range indices are rejected with the axis that failed
//! - Spans are inclusive and may run backwards
//! - Rectangles are visited row-major in each span's direction

use gridkv::error::{Axis, GridError};
use gridkv::grid::range::{self, direction, parse_index, span};
use gridkv::grid::{AxisSpan, CellRange};

// =============================================================================
// parse_index Tests
// =============================================================================

#[test]
fn test_parse_index() {
    assert_eq!(parse_index("42", "Rows").unwrap(), 42);
    assert_eq!(parse_index("-3", "Rows").unwrap(), -3);
    assert_eq!(parse_index(" 7 ", "Rows").unwrap(), 7);
}

#[test]
fn test_parse_index_rejects_non_integers() {
    for raw in ["", "abc", "1.5", "9223372036854775808"] {
        let err = parse_index(raw, "Start row").unwrap_err();
        assert!(matches!(err, GridError::NotAnInteger(ref what) if what == "Start row"));
    }
}

// =============================================================================
// resolve Tests
// =============================================================================

#[test]
fn test_resolve_positive() {
    assert_eq!(range::resolve(0, 3, Axis::Row).unwrap(), 0);
    assert_eq!(range::resolve(2, 3, Axis::Row).unwrap(), 2);
}

#[test]
fn test_resolve_negative_counts_from_end() {
    for n in 1..10usize {
        assert_eq!(range::resolve(-1, n, Axis::Column).unwrap(), n - 1);
        assert_eq!(range::resolve(-(n as i64), n, Axis::Column).unwrap(), 0);
    }
}

#[test]
fn test_resolve_out_of_bounds() {
    for n in 1..10usize {
        let err = range::resolve(-(n as i64) - 1, n, Axis::Column).unwrap_err();
        assert!(matches!(
            err,
            GridError::OutOfBounds { axis: Axis::Column, len, .. } if len == n
        ));

        let err = range::resolve(n as i64, n, Axis::Row).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { axis: Axis::Row, .. }));
    }

    assert!(range::resolve(i64::MIN, 4, Axis::Row).is_err());
    assert!(range::resolve(i64::MAX, 4, Axis::Row).is_err());
}

// =============================================================================
// direction / span Tests
// =============================================================================

#[test]
fn test_direction_and_span() {
    assert_eq!(direction(2, 5), 1);
    assert_eq!(direction(5, 2), -1);
    assert_eq!(direction(3, 3), -1);

    assert_eq!(span(2, 5), 4);
    assert_eq!(span(5, 2), 4);
    assert_eq!(span(3, 3), 1);
}

#[test]
fn test_axis_span_iterates_inclusively_both_ways() {
    let forward: Vec<usize> = AxisSpan::new(1, 4).iter().collect();
    let backward: Vec<usize> = AxisSpan::new(5, 2).iter().collect();
    let single: Vec<usize> = AxisSpan::new(0, 0).iter().collect();

    assert_eq!(forward, vec![1, 2, 3, 4]);
    assert_eq!(backward, vec![5, 4, 3, 2]);
    assert_eq!(single, vec![0]);
    assert_eq!(AxisSpan::new(5, 2).len(), 4);
}

// =============================================================================
// CellRange Tests
// =============================================================================

#[test]
fn test_cell_range_positions_row_major() {
    let range = CellRange::new(1, 0, 0, 1);
    let positions: Vec<(usize, usize)> = range.positions().collect();

    assert_eq!(positions, vec![(1, 0), (1, 1), (0, 0), (0, 1)]);
    assert_eq!(range.len(), 4);
}

#[test]
fn test_cell_range_resolve_with_negatives() {
    let range = CellRange::resolve(-1, 0, 0, -1, 3, 4).unwrap();

    assert_eq!(range, CellRange::new(2, 0, 0, 3));
    assert_eq!(range.len(), 12);
}

#[test]
fn test_cell_range_resolve_reports_failing_axis() {
    let err = CellRange::resolve(0, 0, 0, 4, 3, 4).unwrap_err();
    assert!(matches!(err, GridError::OutOfBounds { axis: Axis::Column, index: 4, len: 4 }));
}

#[test]
fn test_cell_range_check_bounds() {
    let range = CellRange::new(0, 2, 0, 1);

    assert!(range.check_bounds(3, 2).is_ok());
    assert!(matches!(
        range.check_bounds(2, 2),
        Err(GridError::OutOfBounds { axis: Axis::Row, .. })
    ));
}

#[test]
fn test_full_range_covers_grid() {
    let range = CellRange::full(2, 3);
    assert_eq!(range.len(), 6);
    assert_eq!(range.positions().last(), Some((1, 2)));
}
