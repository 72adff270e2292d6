//! Command definitions
//!
//! Parses argument vectors from clients into typed commands. Only arity and
//! integer syntax are checked here; bounds and dimensions are checked by the
//! engine against the grid they target.

use crate::error::{GridError, Result};
use crate::grid::range::parse_index;

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `GRID.DIM key rows columns [value ...]`
    Dimension {
        key: Vec<u8>,
        rows: i64,
        columns: i64,
        values: Option<Vec<String>>,
    },

    /// `GRID.SET key row-start row-end column-start column-end value ...`
    SetRange {
        key: Vec<u8>,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
        values: Vec<String>,
    },

    /// `GRID.RANGE key row-start row-end column-start column-end`
    Range {
        key: Vec<u8>,
        row_start: i64,
        row_end: i64,
        column_start: i64,
        column_end: i64,
    },

    /// `GRID.SHAPE key`
    Shape { key: Vec<u8> },

    /// `GRID.DUMP key`
    Dump { key: Vec<u8> },

    /// `GRID.MEMORY key`
    Memory { key: Vec<u8> },

    /// `GRID.DIGEST key`
    Digest { key: Vec<u8> },

    /// `GET key`
    Get { key: Vec<u8> },

    /// `SET key value`
    Put { key: Vec<u8>, value: Vec<u8> },

    /// `DEL key`
    Delete { key: Vec<u8> },

    /// `PING`
    Ping,

    /// `SAVE`
    Save,

    /// `REWRITE`
    Rewrite,
}

impl Command {
    /// Parse an argument vector whose first element is the command name
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Command> {
        let Some((name, rest)) = args.split_first() else {
            return Err(GridError::WrongArity(String::new()));
        };
        let name = name.as_ref().to_ascii_uppercase();
        let arg = |i: usize| rest[i].as_ref();
        let key = |i: usize| rest[i].as_ref().as_bytes().to_vec();
        let arity = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(GridError::WrongArity(name.to_ascii_lowercase()))
            }
        };

        let command = match name.as_str() {
            "GRID.DIM" => {
                arity(rest.len() >= 3)?;
                let values = (rest.len() > 3).then(|| owned(&rest[3..]));
                Command::Dimension {
                    key: key(0),
                    rows: parse_index(arg(1), "Rows")?,
                    columns: parse_index(arg(2), "Columns")?,
                    values,
                }
            }
            "GRID.SET" => {
                arity(rest.len() >= 6)?;
                Command::SetRange {
                    key: key(0),
                    row_start: parse_index(arg(1), "Start row")?,
                    row_end: parse_index(arg(2), "End row")?,
                    column_start: parse_index(arg(3), "Start column")?,
                    column_end: parse_index(arg(4), "End column")?,
                    values: owned(&rest[5..]),
                }
            }
            "GRID.RANGE" => {
                arity(rest.len() == 5)?;
                Command::Range {
                    key: key(0),
                    row_start: parse_index(arg(1), "Start row")?,
                    row_end: parse_index(arg(2), "End row")?,
                    column_start: parse_index(arg(3), "Start column")?,
                    column_end: parse_index(arg(4), "End column")?,
                }
            }
            "GRID.SHAPE" => {
                arity(rest.len() == 1)?;
                Command::Shape { key: key(0) }
            }
            "GRID.DUMP" => {
                arity(rest.len() == 1)?;
                Command::Dump { key: key(0) }
            }
            "GRID.MEMORY" => {
                arity(rest.len() == 1)?;
                Command::Memory { key: key(0) }
            }
            "GRID.DIGEST" => {
                arity(rest.len() == 1)?;
                Command::Digest { key: key(0) }
            }
            "GET" => {
                arity(rest.len() == 1)?;
                Command::Get { key: key(0) }
            }
            "SET" => {
                arity(rest.len() == 2)?;
                Command::Put {
                    key: key(0),
                    value: key(1),
                }
            }
            "DEL" => {
                arity(rest.len() == 1)?;
                Command::Delete { key: key(0) }
            }
            "PING" => {
                arity(rest.is_empty())?;
                Command::Ping
            }
            "SAVE" => {
                arity(rest.is_empty())?;
                Command::Save
            }
            "REWRITE" => {
                arity(rest.is_empty())?;
                Command::Rewrite
            }
            _ => return Err(GridError::UnknownCommand(name.to_ascii_lowercase())),
        };

        Ok(command)
    }

    /// Whether executing the command can change the keyspace
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Dimension { .. }
                | Command::SetRange { .. }
                | Command::Put { .. }
                | Command::Delete { .. }
        )
    }
}

fn owned<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values.iter().map(|v| v.as_ref().to_string()).collect()
}
