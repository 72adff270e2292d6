//! Protocol Module
//!
//! The command surface clients use, independent of any transport.
//!
//! ### Commands
//! - `GRID.DIM key rows columns [value ...]`: create, resize, or resize and replace
//! - `GRID.SET key rs re cs ce value ...`: overwrite a rectangle
//! - `GRID.RANGE key rs re cs ce`: read a rectangle
//! - `GRID.SHAPE key`: rows and columns
//! - `GRID.DUMP key`: rows, columns and every cell
//! - `GRID.MEMORY key` / `GRID.DIGEST key`: accounting
//! - `GET` / `SET` / `DEL`: plain values and deletion
//! - `PING`, `SAVE`, `REWRITE`
//!
//! Indices may be negative to count from the end, and ranges may run
//! backwards. Command names are case-insensitive.

mod command;
mod reply;

pub use command::Command;
pub use reply::Reply;
