//! Reply definitions
//!
//! Represents the result of a command, before any client-facing formatting.

use std::fmt;

/// A reply to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command succeeded with nothing to return
    Ok,

    /// Answer to `PING`
    Pong,

    /// The key holds nothing
    Nil,

    Integer(u64),

    Text(Vec<u8>),

    /// Answer to `GRID.SHAPE`
    Shape { rows: usize, columns: usize },

    /// Answer to `GRID.RANGE`; absent cells are `None`
    Cells(Vec<Option<String>>),

    /// Answer to `GRID.DUMP`; every cell row-major
    Dump {
        rows: usize,
        columns: usize,
        cells: Vec<Option<String>>,
    },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Pong => f.write_str("PONG"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Text(text) => write!(f, "\"{}\"", String::from_utf8_lossy(text)),
            Reply::Shape { rows, columns } => {
                write!(f, "1) (integer) {}\n2) (integer) {}", rows, columns)
            }
            Reply::Cells(cells) => write_cells(f, cells, 1),
            Reply::Dump {
                rows,
                columns,
                cells,
            } => {
                writeln!(f, "1) (integer) {}", rows)?;
                write!(f, "2) (integer) {}", columns)?;
                if !cells.is_empty() {
                    writeln!(f)?;
                }
                write_cells(f, cells, 3)
            }
        }
    }
}

fn write_cells(f: &mut fmt::Formatter<'_>, cells: &[Option<String>], first: usize) -> fmt::Result {
    if cells.is_empty() && first == 1 {
        return f.write_str("(empty array)");
    }
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        match cell {
            Some(text) => write!(f, "{}) \"{}\"", first + i, text)?,
            None => write!(f, "{}) (nil)", first + i)?,
        }
    }
    Ok(())
}
