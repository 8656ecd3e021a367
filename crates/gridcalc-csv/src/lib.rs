//! # gridcalc-csv
//!
//! CSV reader and writer for gridcalc grids.
//!
//! The header row carries column titles. A column titled `id` becomes the
//! grid's identifier column; every other column is addressable, lettered by
//! position.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
