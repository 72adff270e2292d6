//! Tests for Engine
//!
//! These tests verify:
//! - GRID.DIM create / resize / replace / delete semantics
//! - Validation happens before anything is mutated or logged
//! - Range reads and writes through the keyspace
//! - Plain values and wrong-type errors
//! - Recovery from the command log and from snapshots
//! - Log compaction of grids too large for one record
//! - Operations that fail to apply leave no log entry
//! - Concurrent readers

use std::sync::Arc;
use std::thread;

use gridkv::config::{Config, LogSyncStrategy};
use gridkv::engine::Engine;
use gridkv::error::{Axis, GridError};
use gridkv::grid::StorageBackend;
use gridkv::log::LogReader;
use gridkv::protocol::{Command, Reply};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .log_sync_strategy(LogSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    (temp_dir, engine)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_owned)).collect()
}

fn logged(engine: &Engine) -> usize {
    LogReader::open(&engine.log_path()).unwrap().count()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let engine = Engine::open(Config::builder().data_dir(&data_dir).build()).unwrap();

    assert!(data_dir.exists());
    assert!(engine.log_path().exists());
    assert_eq!(engine.data_dir(), data_dir.as_path());
}

#[test]
fn test_engine_open_path_convenience() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path()).unwrap();

    assert_eq!(engine.backend(), StorageBackend::Flat);
    assert_eq!(engine.key_count(), 0);
    engine.close().unwrap();
}

// =============================================================================
// GRID.DIM Tests
// =============================================================================

#[test]
fn test_dim_creates_empty_grid() {
    let (_temp, engine) = setup_temp_engine();

    engine.dim(b"sheet", 2, 3, None).unwrap();

    assert_eq!(engine.shape(b"sheet").unwrap(), (2, 3));
    let (_, _, all) = engine.dump(b"sheet").unwrap();
    assert_eq!(all, vec![None; 6]);
}

#[test]
fn test_dim_creates_with_values() {
    let (_temp, engine) = setup_temp_engine();

    engine.dim(b"sheet", 2, 2, Some(strings(&["A", "B", "", "D"]))).unwrap();

    assert_eq!(
        engine.dump(b"sheet").unwrap(),
        (2, 2, cells(&[Some("A"), Some("B"), None, Some("D")]))
    );
}

#[test]
fn test_dim_resize_preserves_overlap() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 2, 2, Some(strings(&["A", "B", "C", "D"]))).unwrap();

    engine.dim(b"sheet", 3, 1, None).unwrap();

    assert_eq!(engine.range(b"sheet", 0, 2, 0, 0).unwrap(), cells(&[Some("A"), Some("C"), None]));
}

#[test]
fn test_dim_with_values_replaces() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 2, 2, Some(strings(&["A", "B", "C", "D"]))).unwrap();

    engine.dim(b"sheet", 1, 1, Some(strings(&["Z"]))).unwrap();

    assert_eq!(engine.dump(b"sheet").unwrap(), (1, 1, cells(&[Some("Z")])));
}

#[test]
fn test_dim_zero_deletes_existing_grid() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 2, 2, None).unwrap();

    engine.dim(b"sheet", 0, 5, None).unwrap();

    assert!(matches!(engine.shape(b"sheet"), Err(GridError::EmptyTarget)));
    assert_eq!(engine.key_count(), 0);
}

#[test]
fn test_dim_zero_on_absent_key_is_noop() {
    let (_temp, engine) = setup_temp_engine();

    engine.dim(b"sheet", 3, 0, None).unwrap();

    assert_eq!(engine.key_count(), 0);
    assert_eq!(logged(&engine), 0);
}

#[test]
fn test_dim_negative_dimension() {
    let (_temp, engine) = setup_temp_engine();

    assert!(matches!(
        engine.dim(b"sheet", -1, 2, None),
        Err(GridError::NegativeDimension(Axis::Row))
    ));
    assert!(matches!(
        engine.dim(b"sheet", 1, -2, None),
        Err(GridError::NegativeDimension(Axis::Column))
    ));
    assert_eq!(logged(&engine), 0);
}

#[test]
fn test_dim_too_large() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).max_cells(100).build();
    let engine = Engine::open(config).unwrap();

    engine.dim(b"ok", 10, 10, None).unwrap();
    assert!(matches!(
        engine.dim(b"big", 10, 11, None),
        Err(GridError::GridTooLarge { rows: 10, columns: 11 })
    ));
    assert!(matches!(
        engine.dim(b"huge", i64::MAX, i64::MAX, None),
        Err(GridError::GridTooLarge { .. })
    ));
}

#[test]
fn test_dim_count_mismatch_changes_nothing() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 1, 2, Some(strings(&["a", "b"]))).unwrap();
    let before = logged(&engine);

    let err = engine.dim(b"sheet", 2, 2, Some(strings(&["x", "y", "z"]))).unwrap_err();

    assert!(matches!(err, GridError::ArgumentCountMismatch { expected: 4, actual: 3 }));
    assert_eq!(engine.dump(b"sheet").unwrap(), (1, 2, cells(&[Some("a"), Some("b")])));
    assert_eq!(logged(&engine), before);
}

// =============================================================================
// GRID.SET / GRID.RANGE Tests
// =============================================================================

#[test]
fn test_set_range_and_read_back() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 3, 3, None).unwrap();

    engine.set_range(b"sheet", -1, 1, 0, 1, strings(&["p", "q", "r", "s"])).unwrap();

    assert_eq!(
        engine.range(b"sheet", 2, 1, 0, 1).unwrap(),
        cells(&[Some("p"), Some("q"), Some("r"), Some("s")])
    );
    assert_eq!(
        engine.range(b"sheet", 1, 2, 1, 0).unwrap(),
        cells(&[Some("s"), Some("r"), Some("q"), Some("p")])
    );
    assert_eq!(engine.range(b"sheet", 0, 0, 0, -1).unwrap(), vec![None; 3]);
}

#[test]
fn test_set_range_missing_key() {
    let (_temp, engine) = setup_temp_engine();

    let err = engine.set_range(b"nope", 0, 0, 0, 0, strings(&["v"])).unwrap_err();

    assert!(matches!(err, GridError::EmptyTarget));
    assert_eq!(engine.key_count(), 0);
}

#[test]
fn test_set_range_out_of_bounds() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 2, 2, None).unwrap();

    let err = engine.set_range(b"sheet", 0, 2, 0, 0, strings(&["a", "b", "c"])).unwrap_err();
    assert!(matches!(err, GridError::OutOfBounds { axis: Axis::Row, index: 2, len: 2 }));

    let err = engine.range(b"sheet", 0, 0, -3, 0).unwrap_err();
    assert!(matches!(err, GridError::OutOfBounds { axis: Axis::Column, index: -3, len: 2 }));
}

#[test]
fn test_set_range_count_mismatch_is_checked_first() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"sheet", 2, 2, Some(strings(&["a", "b", "c", "d"]))).unwrap();

    let err = engine.set_range(b"sheet", 0, 1, 0, 1, strings(&["x", "y"])).unwrap_err();

    assert!(matches!(err, GridError::ArgumentCountMismatch { expected: 4, actual: 2 }));
    assert_eq!(engine.range(b"sheet", 0, 0, 0, 1).unwrap(), cells(&[Some("a"), Some("b")]));
}

// =============================================================================
// Accounting Tests
// =============================================================================

#[test]
fn test_memory_and_digest() {
    let (_temp, engine) = setup_temp_engine();
    engine.dim(b"small", 1, 1, None).unwrap();
    engine.dim(b"large", 10, 10, None).unwrap();
    engine.dim(b"copy", 10, 10, None).unwrap();

    assert!(engine.memory_usage(b"large").unwrap() > engine.memory_usage(b"small").unwrap());
    assert_eq!(engine.digest(b"large").unwrap(), engine.digest(b"copy").unwrap());

    engine.set_range(b"copy", 9, 9, 9, 9, strings(&["x"])).unwrap();
    assert_ne!(engine.digest(b"large").unwrap(), engine.digest(b"copy").unwrap());
}

// =============================================================================
// Plain Value Tests
// =============================================================================

#[test]
fn test_plain_values() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"hello", b"world").unwrap();
    assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
    assert_eq!(engine.get(b"missing").unwrap(), None);

    assert!(engine.delete(b"hello").unwrap());
    assert!(!engine.delete(b"hello").unwrap());
    assert_eq!(engine.get(b"hello").unwrap(), None);
}

#[test]
fn test_wrong_stored_type() {
    let (_temp, engine) = setup_temp_engine();
    engine.put(b"text", b"value").unwrap();
    engine.dim(b"grid", 1, 1, None).unwrap();

    assert!(matches!(engine.dim(b"text", 1, 1, None), Err(GridError::WrongStoredType)));
    assert!(matches!(engine.dim(b"text", 0, 0, None), Err(GridError::WrongStoredType)));
    assert!(matches!(
        engine.set_range(b"text", 0, 0, 0, 0, strings(&["v"])),
        Err(GridError::WrongStoredType)
    ));
    assert!(matches!(engine.shape(b"text"), Err(GridError::WrongStoredType)));
    assert!(matches!(engine.dump(b"text"), Err(GridError::WrongStoredType)));
    assert!(matches!(engine.get(b"grid"), Err(GridError::WrongStoredType)));

    // SET replaces whatever the key held
    engine.put(b"grid", b"now text").unwrap();
    assert_eq!(engine.get(b"grid").unwrap(), Some(b"now text".to_vec()));
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_execute_routes_commands() {
    let (_temp, engine) = setup_temp_engine();
    let run = |line: &str| {
        let args: Vec<&str> = line.split_whitespace().collect();
        engine.execute(Command::parse(&args).unwrap())
    };

    assert_eq!(run("PING").unwrap(), Reply::Pong);
    assert_eq!(run("GRID.DIM s 2 2 a b c d").unwrap(), Reply::Ok);
    assert_eq!(run("GRID.SHAPE s").unwrap(), Reply::Shape { rows: 2, columns: 2 });
    assert_eq!(run("GRID.SET s 1 1 1 0 y x").unwrap(), Reply::Ok);
    assert_eq!(
        run("GRID.RANGE s 1 1 0 1").unwrap(),
        Reply::Cells(cells(&[Some("x"), Some("y")]))
    );
    assert_eq!(
        run("GRID.DUMP s").unwrap(),
        Reply::Dump {
            rows: 2,
            columns: 2,
            cells: cells(&[Some("a"), Some("b"), Some("x"), Some("y")]),
        }
    );
    assert!(matches!(run("GRID.MEMORY s").unwrap(), Reply::Integer(n) if n > 0));
    assert!(matches!(run("GRID.DIGEST s").unwrap(), Reply::Integer(_)));
    assert_eq!(run("GET nothing").unwrap(), Reply::Nil);
    assert_eq!(run("SET t v").unwrap(), Reply::Ok);
    assert_eq!(run("GET t").unwrap(), Reply::Text(b"v".to_vec()));
    assert_eq!(run("DEL t").unwrap(), Reply::Integer(1));
    assert_eq!(run("DEL t").unwrap(), Reply::Integer(0));
    assert_eq!(run("SAVE").unwrap(), Reply::Ok);
    assert_eq!(run("REWRITE").unwrap(), Reply::Ok);
    assert!(matches!(run("GRID.RANGE s 0 5 0 0"), Err(GridError::OutOfBounds { .. })));
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recovery_from_log() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir)).unwrap();
        engine.dim(b"sheet", 2, 2, Some(strings(&["A", "B", "C", "D"]))).unwrap();
        engine.dim(b"sheet", 3, 1, None).unwrap();
        engine.set_range(b"sheet", 2, 2, 0, 0, strings(&["E"])).unwrap();
        engine.put(b"note", b"kept").unwrap();
        engine.dim(b"gone", 1, 1, None).unwrap();
        engine.delete(b"gone").unwrap();
        assert_eq!(logged(&engine), 6);
        // Simulated crash: no save, no close
    }

    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert_eq!(
        engine.dump(b"sheet").unwrap(),
        (3, 1, cells(&[Some("A"), Some("C"), Some("E")]))
    );
    assert_eq!(engine.get(b"note").unwrap(), Some(b"kept".to_vec()));
    assert!(matches!(engine.shape(b"gone"), Err(GridError::EmptyTarget)));

    // Log was compacted to one record per key on open
    assert_eq!(logged(&engine), 2);
}

#[test]
fn test_recovery_without_rewrite_keeps_log() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .rewrite_log_on_open(false)
        .build();

    {
        let engine = Engine::open(config.clone()).unwrap();
        engine.dim(b"sheet", 1, 1, None).unwrap();
        engine.dim(b"sheet", 2, 2, None).unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.shape(b"sheet").unwrap(), (2, 2));
    assert_eq!(logged(&engine), 2);
    assert_eq!(engine.current_lsn(), 3);
}

#[test]
fn test_save_snapshot_and_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir)).unwrap();
        engine.dim(b"sheet", 2, 3, Some(strings(&["a", "", "c", "d", "e", ""]))).unwrap();
        engine.put(b"note", b"text").unwrap();
        engine.save().unwrap();

        assert!(engine.snapshot_path().exists());
        assert_eq!(logged(&engine), 0);

        // Written after the snapshot, so only in the log
        engine.set_range(b"sheet", 0, 0, 1, 1, strings(&["b"])).unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert_eq!(
        engine.dump(b"sheet").unwrap(),
        (2, 3, cells(&[Some("a"), Some("b"), Some("c"), Some("d"), Some("e"), None]))
    );
    assert_eq!(engine.get(b"note").unwrap(), Some(b"text".to_vec()));
}

#[test]
fn test_reopen_with_other_backend() {
    let temp_dir = TempDir::new().unwrap();

    let digest = {
        let engine = Engine::open(config_for(&temp_dir)).unwrap();
        engine.dim(b"sheet", 3, 2, Some(strings(&["1", "2", "3", "4", "5", "6"]))).unwrap();
        engine.save().unwrap();
        engine.digest(b"sheet").unwrap()
    };

    let config = Config::builder()
        .data_dir(temp_dir.path())
        .default_backend(StorageBackend::RowWise)
        .build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.backend(), StorageBackend::RowWise);
    assert_eq!(engine.digest(b"sheet").unwrap(), digest);
}

#[test]
fn test_rewrite_log_reproduces_state() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .rewrite_log_on_open(false)
        .build();

    let before = {
        let engine = Engine::open(config.clone()).unwrap();
        for i in 0..10 {
            engine.dim(b"sheet", i + 1, 2, None).unwrap();
        }
        engine.set_range(b"sheet", -1, 0, 1, 1, (0..10).map(|i| i.to_string()).collect()).unwrap();

        assert_eq!(engine.rewrite_log().unwrap(), 1);
        assert_eq!(logged(&engine), 1);
        let dump = engine.dump(b"sheet").unwrap();
        engine.close().unwrap();
        dump
    };

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.dump(b"sheet").unwrap(), before);
}

#[test]
fn test_rewrite_splits_grid_larger_than_one_record() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_log_record_bytes(512)
        .build();

    let before = {
        let engine = Engine::open(config.clone()).unwrap();
        engine.dim(b"wide", 40, 12, None).unwrap();
        engine.set_range(b"wide", 0, 9, 0, 11, (0..120).map(|i| format!("cell-{i}")).collect()).unwrap();
        engine.set_range(b"wide", 30, 30, 0, 11, strings(&["x"; 12])).unwrap();
        engine.dim(b"blank", 6000, 100, None).unwrap();
        let dump = (engine.dump(b"wide").unwrap(), engine.shape(b"blank").unwrap());
        engine.close().unwrap();
        dump
    };

    let engine = Engine::open(config.clone()).unwrap();
    assert_eq!((engine.dump(b"wide").unwrap(), engine.shape(b"blank").unwrap()), before);
    // Banded records plus Delete/Dimension headers for both grids
    assert!(logged(&engine) > 4);
    assert!(!engine.log_path().with_extension("rewrite").exists());
    engine.close().unwrap();

    // The banded log itself replays to the same state
    let engine = Engine::open(config).unwrap();
    assert_eq!((engine.dump(b"wide").unwrap(), engine.shape(b"blank").unwrap()), before);
}

#[test]
fn test_rewrite_after_snapshot_keeps_deletes() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = Engine::open(config_for(&temp_dir)).unwrap();
        engine.dim(b"kept", 1, 1, Some(strings(&["k"]))).unwrap();
        engine.dim(b"dropped", 1, 1, Some(strings(&["d"]))).unwrap();
        engine.save().unwrap();
        assert!(engine.delete(b"dropped").unwrap());
        engine.close().unwrap();
    }

    // Replays the delete, then compacts the log and retires the snapshot
    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert!(!engine.snapshot_path().exists());
    engine.close().unwrap();

    let engine = Engine::open(config_for(&temp_dir)).unwrap();
    assert_eq!(engine.range(b"kept", 0, 0, 0, 0).unwrap(), cells(&[Some("k")]));
    assert!(matches!(engine.shape(b"dropped"), Err(GridError::EmptyTarget)));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_failed_apply_is_not_logged() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .max_cells(usize::MAX)
        .log_sync_strategy(LogSyncStrategy::EveryWrite)
        .build();

    {
        let engine = Engine::open(config.clone()).unwrap();
        engine.dim(b"small", 1, 1, None).unwrap();

        // Passes validation, but the cell buffer cannot be reserved
        let result = engine.dim(b"huge", 1 << 31, 1 << 31, None);
        assert!(matches!(result, Err(GridError::AllocationFailure)));
        assert!(matches!(engine.shape(b"huge"), Err(GridError::EmptyTarget)));

        assert_eq!(logged(&engine), 1);
        assert_eq!(engine.current_lsn(), 2);

        // The log keeps accepting entries after the discarded one
        engine.dim(b"small", 2, 2, None).unwrap();
        assert_eq!(logged(&engine), 2);
        engine.close().unwrap();
    }

    let engine = Engine::open(config).unwrap();
    assert!(matches!(engine.shape(b"huge"), Err(GridError::EmptyTarget)));
    assert_eq!(engine.shape(b"small").unwrap(), (2, 2));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_reads() {
    let (_temp, engine) = setup_temp_engine();
    let values: Vec<String> = (0..100).map(|i| format!("v{}", i)).collect();
    engine.dim(b"sheet", 10, 10, Some(values)).unwrap();
    let engine = Arc::new(engine);

    let mut handles = vec![];
    for _ in 0..4 {
        let engine_clone = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for row in 0..10i64 {
                let got = engine_clone.range(b"sheet", row, row, 0, 9).unwrap();
                let expected: Vec<Option<String>> =
                    (0..10).map(|c| Some(format!("v{}", row * 10 + c))).collect();
                assert_eq!(got, expected);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writes_to_separate_grids() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let mut handles = vec![];
    for t in 0..4 {
        let engine_clone = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let key = format!("grid{}", t).into_bytes();
            engine_clone.dim(&key, 1, 1, None).unwrap();
            for i in 1..=20 {
                engine_clone.dim(&key, i, i, None).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..4 {
        assert_eq!(engine.shape(format!("grid{}", t).as_bytes()).unwrap(), (20, 20));
    }
    assert_eq!(logged(&engine), 4 * 21);
}
