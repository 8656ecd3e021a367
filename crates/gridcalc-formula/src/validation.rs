//! Pre-save formula checks

use crate::ast::{FormulaExpr, Reference};
use crate::error::FormulaResult;
use crate::parser::{parse_formula_with, Grammar};
use gridcalc_core::{CellAddress, GridBounds};
use std::collections::BTreeSet;

/// Outcome of [`validate_formula`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaValidation {
    pub is_valid: bool,
    /// Human-readable reason when invalid
    pub error: Option<String>,
    /// Machine-readable code when invalid
    pub error_code: Option<&'static str>,
    /// Referenced cells as A1 strings, row-major and deduplicated
    pub dependencies: Vec<String>,
}

impl FormulaValidation {
    fn invalid(code: &'static str, message: String, dependencies: Vec<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message),
            error_code: Some(code),
            dependencies,
        }
    }
}

/// Check a formula before it is stored in a cell
///
/// With `bounds`, every referenced cell and both corners of every range must
/// lie inside the grid. Ranges are expanded into their cells when bounds are
/// known (clamped to the grid); without bounds they are listed as written.
///
/// ```
/// use gridcalc_core::GridBounds;
/// use gridcalc_formula::validate_formula;
///
/// let result = validate_formula("=E1", Some(GridBounds::new(3, 4)));
/// assert!(!result.is_valid);
/// assert_eq!(
///     result.error.as_deref(),
///     Some("Column E does not exist (valid columns: A-D)")
/// );
/// ```
pub fn validate_formula(formula: &str, bounds: Option<GridBounds>) -> FormulaValidation {
    validate_formula_with(formula, bounds, Grammar::Expression)
}

/// Check a formula against the grammar it will be evaluated with
pub fn validate_formula_with(
    formula: &str,
    bounds: Option<GridBounds>,
    grammar: Grammar,
) -> FormulaValidation {
    let expr = match parse_formula_with(formula, grammar).and_then(|expr| check_arity(&expr).map(|_| expr)) {
        Ok(expr) => expr,
        Err(e) => return FormulaValidation::invalid(e.code(), e.to_string(), Vec::new()),
    };

    let references = expr.references();
    let dependencies = list_dependencies(&references, bounds);

    if let Some(bounds) = bounds {
        for reference in &references {
            let corners = match reference {
                Reference::Cell(addr) => vec![*addr],
                Reference::Range(range) => vec![range.start, range.end],
            };
            for addr in corners {
                if let Some(message) = out_of_bounds_message(addr, bounds) {
                    return FormulaValidation::invalid("OUT_OF_BOUNDS", message, dependencies);
                }
            }
        }
    }

    FormulaValidation {
        is_valid: true,
        error: None,
        error_code: None,
        dependencies,
    }
}

/// Check argument counts of every function call in an expression
pub fn check_arity(expr: &FormulaExpr) -> FormulaResult<()> {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::CellRef(_) | FormulaExpr::RangeRef(_) => Ok(()),
        FormulaExpr::Function { func, args } => {
            func.check_arity(args.len())?;
            args.iter().try_for_each(check_arity)
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            check_arity(left)?;
            check_arity(right)
        }
        FormulaExpr::Negate(inner) => check_arity(inner),
    }
}

fn list_dependencies(references: &[Reference], bounds: Option<GridBounds>) -> Vec<String> {
    let mut cells = BTreeSet::new();
    let mut ranges = Vec::new();

    for reference in references {
        match (reference, bounds) {
            (Reference::Cell(addr), _) => {
                cells.insert(*addr);
            }
            (Reference::Range(range), Some(bounds)) => {
                if let Some(clamped) = range.clamp(bounds) {
                    cells.extend(clamped.cells());
                }
            }
            (Reference::Range(range), None) => {
                let text = range.to_string();
                if !ranges.contains(&text) {
                    ranges.push(text);
                }
            }
        }
    }

    cells
        .into_iter()
        .map(|addr: CellAddress| addr.to_string())
        .chain(ranges)
        .collect()
}

fn out_of_bounds_message(addr: CellAddress, bounds: GridBounds) -> Option<String> {
    if addr.col >= bounds.cols {
        let letters = CellAddress::column_to_letters(addr.col);
        return Some(if bounds.cols == 0 {
            format!("Column {} does not exist (the grid has no columns)", letters)
        } else {
            format!(
                "Column {} does not exist (valid columns: A-{})",
                letters,
                CellAddress::column_to_letters(bounds.cols - 1)
            )
        });
    }

    if addr.row >= bounds.rows {
        let row = addr.row as u64 + 1;
        return Some(if bounds.rows == 0 {
            format!("Row {} does not exist (the grid has no rows)", row)
        } else {
            format!("Row {} does not exist (valid rows: 1-{})", row, bounds.rows)
        });
    }

    None
}
