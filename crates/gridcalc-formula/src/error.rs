//! Formula error types

use gridcalc_core::{CellAddress, GridBounds};
use std::fmt;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing or checking a formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Blank formula text
    #[error("Formula is empty")]
    Empty,

    /// Text does not start with '='
    #[error("Formula must start with '='")]
    MissingEquals,

    /// A function call or group was not closed
    #[error("Missing closing parenthesis")]
    MissingParen,

    /// Function name is not SUM or AVERAGE
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Input ended where an operand was expected
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// A token that does not fit the grammar
    #[error("Unexpected {0}")]
    UnexpectedToken(String),

    /// Malformed cell reference
    #[error("Invalid cell reference '{0}'")]
    InvalidReference(String),

    /// Rejected by the single-operation grammar
    #[error("Only a cell reference, a SUM/AVERAGE call or a single arithmetic operation is supported")]
    UnsupportedShape,

    /// Parentheses, signs or chained operators nested past the limit
    #[error("Formula is nested too deeply (more than {0} levels)")]
    TooDeep(usize),

    /// Too few arguments for a function
    #[error("{function} expects at least {min} argument(s), got {actual}")]
    ArgumentCount {
        function: &'static str,
        min: usize,
        actual: usize,
    },
}

impl FormulaError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::Empty => "EMPTY_FORMULA",
            FormulaError::MissingEquals => "MISSING_EQUALS",
            FormulaError::MissingParen => "MISSING_PAREN",
            FormulaError::UnknownFunction(_) => "UNKNOWN_FUNCTION",
            FormulaError::UnexpectedEnd | FormulaError::UnexpectedToken(_) => "PARSE_ERROR",
            FormulaError::InvalidReference(_) => "INVALID_REFERENCE",
            FormulaError::UnsupportedShape => "UNSUPPORTED_SHAPE",
            FormulaError::TooDeep(_) => "TOO_DEEP",
            FormulaError::ArgumentCount { .. } => "ARGUMENT_COUNT",
        }
    }
}

/// Per-cell evaluation error
///
/// These are values, not failures: a cell holding one still produces output,
/// and any formula reading it inherits the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// The formula could not be parsed
    Parse(FormulaError),
    /// A single-cell reference points outside the grid
    OutOfBounds {
        reference: CellAddress,
        bounds: GridBounds,
    },
    /// Division by zero
    DivByZero,
    /// The cell is part of a reference cycle
    Circular,
    /// Runtime shape, arity or overflow failure
    Invalid(String),
}

impl CellError {
    /// Short code written into the output cell
    pub fn code(&self) -> &'static str {
        match self {
            CellError::DivByZero => "#DIV/0!",
            CellError::Circular => "#CIRCULAR!",
            CellError::Parse(_) | CellError::OutOfBounds { .. } | CellError::Invalid(_) => {
                "#ERROR!"
            }
        }
    }

    /// Create an invalid error with a message
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        CellError::Invalid(msg.into())
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Parse(err) => write!(f, "{}", err),
            CellError::OutOfBounds { reference, bounds } => write!(
                f,
                "Reference {} is out of bounds (valid range: {})",
                reference, bounds
            ),
            CellError::DivByZero => write!(f, "#DIV/0!"),
            CellError::Circular => write!(f, "Circular dependency detected"),
            CellError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<FormulaError> for CellError {
    fn from(err: FormulaError) -> Self {
        CellError::Parse(err)
    }
}
