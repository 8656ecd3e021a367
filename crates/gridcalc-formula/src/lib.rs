//! # gridcalc-formula
//!
//! Formula parser and evaluator for gridcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value) with lenient coercion of literal cells
//! - `SUM` and `AVERAGE`
//! - A dependency graph with cycle detection and evaluation ordering
//! - Pre-save formula validation
//!
//! ## Example
//!
//! ```rust
//! use ahash::AHashMap;
//! use gridcalc_core::Grid;
//! use gridcalc_formula::{evaluate, parse_formula, EvaluationContext};
//!
//! let grid = Grid::from_values(&[vec!["1", "2", "3"]]);
//! let computed = AHashMap::new();
//! let ctx = EvaluationContext::new(&grid, &computed);
//!
//! let ast = parse_formula("=SUM(A1:C1)/2").unwrap();
//! assert_eq!(evaluate(&ast, &ctx).display(), "3");
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod validation;

pub use ast::{BinaryOperator, FormulaExpr, Reference};
pub use dependency::{DependencyGraph, GraphAnalysis, GraphStats};
pub use error::{CellError, FormulaError, FormulaResult};
pub use evaluator::{coerce_number, evaluate, format_number, EvaluationContext, FormulaValue};
pub use functions::BuiltinFunction;
pub use parser::{parse_formula, parse_formula_with, Grammar, MAX_NESTING};
pub use validation::{check_arity, validate_formula, validate_formula_with, FormulaValidation};
