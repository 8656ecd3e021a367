//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationStats,
    CellAddress,
    CellError,
    CellRange,
    ColumnDef,
    CsvReader,
    CsvWriter,
    // Error types
    Error,
    Evaluation,
    EvaluationResponse,
    Grammar,
    // Main types
    Grid,
    GridBounds,
    // Extension traits
    GridCalculationExt,
    GridExt,
    Result,
    Row,
};
