//! # gridcalc-core
//!
//! Core data structures for the gridcalc formula engine.
//!
//! This crate provides the types shared by the parser, the evaluator and the
//! file adapters:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//! - [`ColumnDef`] and [`Row`] - The editable dataset as a client sends it
//! - [`Grid`] and [`GridBounds`] - A validated snapshot with positional columns
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellAddress, Grid};
//!
//! let mut grid = Grid::from_values(&[vec!["10", "20", ""]]);
//! grid.set("C1", "=A1+B1").unwrap();
//!
//! assert_eq!(grid.raw(CellAddress::new(0, 2)), Some("=A1+B1"));
//! assert_eq!(grid.bounds().to_string(), "A1:C1");
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod grid;
pub mod row;

// Re-exports for convenience
pub use cell::{CellAddress, CellRange, CellRangeIterator};
pub use column::{ColumnDef, ID_COLUMN_KEY};
pub use error::{Error, Result};
pub use grid::{Grid, GridBounds};
pub use row::Row;
