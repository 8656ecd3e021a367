//! # gridcalc
//!
//! Spreadsheet-style formula evaluation over small editable grids.
//!
//! A grid snapshot (ordered column definitions plus rows of raw cell text)
//! goes in; an evaluated snapshot plus per-cell errors comes out. Formulas
//! reference cells positionally (`A1`, `AA23`, `A1:B3`) and may use `+ - * /`,
//! parentheses, `SUM` and `AVERAGE`.
//!
//! ## Features
//!
//! - Dependency-ordered evaluation with circular reference detection
//! - Lenient coercion: a leading number is read, other text and blanks read as 0
//! - Errors as values (`#ERROR!`, `#DIV/0!`, `#CIRCULAR!`) that flow to dependents
//! - Pre-save formula validation against the grid's bounds
//! - JSON and CSV grid files
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let grid = Grid::from_values(&[
//!     vec!["1", "=A1*10"],
//!     vec!["2", "=SUM(A1:A2)"],
//! ]);
//!
//! let evaluation = gridcalc::evaluate(&grid).unwrap();
//! assert_eq!(evaluation.value("B1"), Some("10"));
//! assert_eq!(evaluation.value("B2"), Some("3"));
//!
//! // Save to file
//! // evaluation.grid.save("output.json").unwrap();
//! ```

pub mod calculation;
pub mod prelude;
pub mod response;

// Re-export calculation types
pub use calculation::{
    evaluate, evaluate_with_options, CalculationOptions, CalculationStats, Evaluation,
    GridCalculationExt,
};
pub use response::{DependencyInfo, EvaluationResponse, GraphStatsReport};

// Re-export core types
pub use gridcalc_core::{
    CellAddress, CellRange, ColumnDef, Error, Grid, GridBounds, Result, Row, ID_COLUMN_KEY,
};

// Re-export formula types
pub use gridcalc_formula::{
    parse_formula, parse_formula_with, validate_formula, validate_formula_with, CellError,
    FormulaError, FormulaExpr, FormulaValidation, FormulaValue, GraphStats, Grammar, MAX_NESTING,
};

// Re-export I/O types
pub use gridcalc_csv::{CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Extension trait for Grid to add file I/O
pub trait GridExt {
    /// Open a grid from a `.json` or `.csv` file
    fn open<P: AsRef<Path>>(path: P) -> Result<Grid>;

    /// Save the grid to a `.json` or `.csv` file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl GridExt for Grid {
    fn open<P: AsRef<Path>>(path: P) -> Result<Grid> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("json") => {
                let file = File::open(path).map_err(|e| Error::other(e.to_string()))?;
                serde_json::from_reader(BufReader::new(file))
                    .map_err(|e| Error::other(format!("{}: {}", path.display(), e)))
            }
            Some("csv") => CsvReader::read_file(path, &CsvReadOptions::default())
                .map_err(|e| Error::other(e.to_string())),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("json") => {
                let file = File::create(path).map_err(|e| Error::other(e.to_string()))?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, self)
                    .map_err(|e| Error::other(e.to_string()))?;
                writer.flush().map_err(|e| Error::other(e.to_string()))
            }
            Some("csv") => CsvWriter::write_file(self, path, &CsvWriteOptions::default())
                .map_err(|e| Error::other(e.to_string())),
            _ => Err(Error::other(format!(
                "Unsupported file format: {}",
                path.display()
            ))),
        }
    }
}
