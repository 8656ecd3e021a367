//! Formula Abstract Syntax Tree types

use crate::functions::BuiltinFunction;
use gridcalc_core::{CellAddress, CellRange};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),
    /// Single cell reference
    CellRef(CellAddress),
    /// Range reference, only meaningful as a function argument
    RangeRef(CellRange),

    /// Built-in function call
    Function {
        func: BuiltinFunction,
        args: Vec<FormulaExpr>,
    },

    /// Binary arithmetic
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary minus
    Negate(Box<FormulaExpr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A reference found in a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Cell(CellAddress),
    Range(CellRange),
}

impl FormulaExpr {
    /// All cell and range references, in source order
    pub fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<Reference>) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::CellRef(addr) => refs.push(Reference::Cell(*addr)),
            FormulaExpr::RangeRef(range) => refs.push(Reference::Range(*range)),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
            FormulaExpr::Negate(inner) => inner.collect_references(refs),
        }
    }
}
