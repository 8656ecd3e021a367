//! Built-in functions

pub mod math;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;
use std::fmt;

/// One evaluated function argument
///
/// `count` is the number of cells the argument addresses, whether or not they
/// exist in the grid. A scalar argument counts as one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub sum: f64,
    pub count: u64,
}

impl Aggregate {
    /// Aggregate for a single scalar value
    pub fn scalar(value: f64) -> Self {
        Self {
            sum: value,
            count: 1,
        }
    }
}

/// Function implementation signature
pub type FunctionImpl = fn(&[Aggregate]) -> FormulaValue;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Implementation
    pub implementation: FunctionImpl,
}

static SUM: FunctionDef = FunctionDef {
    name: "SUM",
    min_args: 1,
    implementation: math::fn_sum,
};

static AVERAGE: FunctionDef = FunctionDef {
    name: "AVERAGE",
    min_args: 1,
    implementation: math::fn_average,
};

/// The functions a formula may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Sum,
    Average,
}

impl BuiltinFunction {
    /// Look up a function by name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(BuiltinFunction::Sum),
            "AVERAGE" => Some(BuiltinFunction::Average),
            _ => None,
        }
    }

    /// Definition backing this function
    pub fn def(self) -> &'static FunctionDef {
        match self {
            BuiltinFunction::Sum => &SUM,
            BuiltinFunction::Average => &AVERAGE,
        }
    }

    /// Uppercase name
    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Check the argument count
    pub fn check_arity(self, actual: usize) -> FormulaResult<()> {
        let def = self.def();
        if actual < def.min_args {
            return Err(FormulaError::ArgumentCount {
                function: def.name,
                min: def.min_args,
                actual,
            });
        }
        Ok(())
    }

    /// Apply the function to evaluated arguments
    pub fn apply(self, args: &[Aggregate]) -> FormulaValue {
        (self.def().implementation)(args)
    }
}

impl fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
