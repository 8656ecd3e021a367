//! Cell addressing
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")

mod address;

pub use address::{CellAddress, CellRange, CellRangeIterator};
