//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{BinaryOperator, FormulaExpr};
use crate::error::CellError;
use crate::functions::{Aggregate, BuiltinFunction};
use ahash::AHashMap;
use gridcalc_core::{CellAddress, Grid};

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Error(CellError),
}

impl FormulaValue {
    /// Wrap an arithmetic result, turning infinities and NaN into an error
    pub fn checked(n: f64) -> Self {
        if n.is_finite() {
            FormulaValue::Number(n)
        } else {
            FormulaValue::Error(CellError::invalid("Numeric overflow"))
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Text written into the output cell
    pub fn display(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::Error(e) => e.code().to_string(),
        }
    }
}

/// Format a number for display
///
/// Whole numbers print without a fractional part, everything else uses the
/// shortest text that parses back to the same value.
///
/// ```
/// use gridcalc_formula::format_number;
///
/// assert_eq!(format_number(30.0), "30");
/// assert_eq!(format_number(2.5), "2.5");
/// assert_eq!(format_number(-0.0), "0");
/// ```
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Read literal cell content as a number
///
/// The longest numeric prefix after leading whitespace is the value, so
/// `"10 kg"` reads as 10 and `"5%"` as 5. Text with no numeric prefix, blanks
/// and values too large for an `f64` read as 0.
///
/// ```
/// use gridcalc_formula::coerce_number;
///
/// assert_eq!(coerce_number(" 12abc"), 12.0);
/// assert_eq!(coerce_number("-.5e1x"), -5.0);
/// assert_eq!(coerce_number("$1,200"), 0.0);
/// ```
pub fn coerce_number(raw: &str) -> f64 {
    let text = raw.trim_start();
    let len = numeric_prefix_len(text.as_bytes());
    text[..len]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Length of `[+-]digits[.digits][(e|E)[+-]digits]` at the start of `bytes`
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits_from(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    end
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// The grid being evaluated
    pub grid: &'a Grid,
    /// Results of formula cells evaluated so far
    pub computed: &'a AHashMap<CellAddress, FormulaValue>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(grid: &'a Grid, computed: &'a AHashMap<CellAddress, FormulaValue>) -> Self {
        Self { grid, computed }
    }

    /// Current value of a cell
    ///
    /// Formula cells yield their computed value; literals are coerced.
    pub fn cell_value(&self, addr: CellAddress) -> FormulaValue {
        let bounds = self.grid.bounds();
        if !bounds.contains(&addr) {
            return FormulaValue::Error(CellError::OutOfBounds {
                reference: addr,
                bounds,
            });
        }

        if let Some(value) = self.computed.get(&addr) {
            return value.clone();
        }

        match self.grid.raw(addr) {
            Some(raw) if raw.starts_with('=') => FormulaValue::Error(CellError::invalid(format!(
                "Cell {} has not been evaluated",
                addr
            ))),
            Some(raw) => FormulaValue::Number(coerce_number(raw)),
            None => FormulaValue::Number(0.0),
        }
    }

    /// Sum and addressed-cell count of a range
    ///
    /// Only the part of the range inside the grid is read; the rest counts
    /// toward the total as zero-valued cells.
    fn range_aggregate(&self, range: gridcalc_core::CellRange) -> Result<Aggregate, CellError> {
        let mut sum = 0.0;
        if let Some(clamped) = range.clamp(self.grid.bounds()) {
            for addr in clamped.cells() {
                match self.cell_value(addr) {
                    FormulaValue::Number(n) => sum += n,
                    FormulaValue::Error(e) => return Err(e),
                }
            }
        }

        Ok(Aggregate {
            sum,
            count: range.cell_count(),
        })
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaValue {
    match expr {
        FormulaExpr::Number(n) => FormulaValue::Number(*n),

        FormulaExpr::CellRef(addr) => ctx.cell_value(*addr),

        FormulaExpr::RangeRef(range) => FormulaValue::Error(CellError::invalid(format!(
            "Range {} can only be used as a function argument",
            range
        ))),

        FormulaExpr::Negate(operand) => match evaluate(operand, ctx) {
            FormulaValue::Number(n) => FormulaValue::Number(-n),
            err => err,
        },

        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::Function { func, args } => evaluate_function(*func, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaValue {
    // Left operand's error wins
    let l = match evaluate(left, ctx) {
        FormulaValue::Number(n) => n,
        err => return err,
    };
    let r = match evaluate(right, ctx) {
        FormulaValue::Number(n) => n,
        err => return err,
    };

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return FormulaValue::Error(CellError::DivByZero);
            }
            l / r
        }
    };

    FormulaValue::checked(result)
}

/// Evaluate a built-in function call
fn evaluate_function(
    func: BuiltinFunction,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaValue {
    if let Err(e) = func.check_arity(args.len()) {
        return FormulaValue::Error(CellError::invalid(e.to_string()));
    }

    let mut aggregates = Vec::with_capacity(args.len());
    for arg in args {
        let aggregate = match arg {
            FormulaExpr::RangeRef(range) => ctx.range_aggregate(*range),
            other => match evaluate(other, ctx) {
                FormulaValue::Number(n) => Ok(Aggregate::scalar(n)),
                FormulaValue::Error(e) => Err(e),
            },
        };
        match aggregate {
            Ok(a) => aggregates.push(a),
            Err(e) => return FormulaValue::Error(e),
        }
    }

    func.apply(&aggregates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use gridcalc_core::GridBounds;
    use pretty_assertions::assert_eq;

    fn eval_in(grid: &Grid, formula: &str) -> FormulaValue {
        let computed = AHashMap::new();
        let ctx = EvaluationContext::new(grid, &computed);
        evaluate(&parse_formula(formula).unwrap(), &ctx)
    }

    fn eval_str(formula: &str) -> FormulaValue {
        eval_in(&Grid::from_values(&[vec!["10", "20", "0", "abc"]]), formula)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_str("=A1+B1"), FormulaValue::Number(30.0));
        assert_eq!(eval_str("=B1-A1"), FormulaValue::Number(10.0));
        assert_eq!(eval_str("=A1*2"), FormulaValue::Number(20.0));
        assert_eq!(eval_str("=B1/A1"), FormulaValue::Number(2.0));
        assert_eq!(eval_str("=(A1+B1)*-2"), FormulaValue::Number(-60.0));
        assert_eq!(eval_str("=A1/4-B1"), FormulaValue::Number(-17.5));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_str("=A1/C1"), FormulaValue::Error(CellError::DivByZero));
        assert_eq!(eval_str("=A1/0"), FormulaValue::Error(CellError::DivByZero));
        // Text coerces to 0
        assert_eq!(eval_str("=A1/D1"), FormulaValue::Error(CellError::DivByZero));
    }

    #[test]
    fn test_lenient_coercion() {
        let grid = Grid::from_values(&[vec!["abc", " 5 ", "", "1e3", "inf"]]);
        assert_eq!(eval_in(&grid, "=A1"), FormulaValue::Number(0.0));
        assert_eq!(eval_in(&grid, "=B1"), FormulaValue::Number(5.0));
        assert_eq!(eval_in(&grid, "=C1"), FormulaValue::Number(0.0));
        assert_eq!(eval_in(&grid, "=D1"), FormulaValue::Number(1000.0));
        assert_eq!(eval_in(&grid, "=E1"), FormulaValue::Number(0.0));
        assert_eq!(eval_in(&grid, "=SUM(A1:B1)"), FormulaValue::Number(5.0));

        let grid = Grid::from_values(&[vec!["12abc", "10 kg", "$1,200", "5%"]]);
        assert_eq!(eval_in(&grid, "=A1+B1"), FormulaValue::Number(22.0));
        assert_eq!(eval_in(&grid, "=SUM(A1:C1)"), FormulaValue::Number(22.0));
        assert_eq!(eval_in(&grid, "=D1"), FormulaValue::Number(5.0));
    }

    #[test]
    fn test_coerce_number_prefixes() {
        assert_eq!(coerce_number("1,200"), 1.0);
        assert_eq!(coerce_number("  -3.25 m"), -3.25);
        assert_eq!(coerce_number("+7"), 7.0);
        assert_eq!(coerce_number(".5"), 0.5);
        assert_eq!(coerce_number("4."), 4.0);
        assert_eq!(coerce_number("2e"), 2.0);
        assert_eq!(coerce_number("2e+x"), 2.0);
        assert_eq!(coerce_number("1.5E2kg"), 150.0);
        assert_eq!(coerce_number("1e999"), 0.0);
        assert_eq!(coerce_number("-"), 0.0);
        assert_eq!(coerce_number("."), 0.0);
        assert_eq!(coerce_number("-.x"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
    }

    #[test]
    fn test_sum_and_average() {
        let grid = Grid::from_values(&[vec!["4"], vec!["6"], vec![""], vec!["x"]]);
        assert_eq!(eval_in(&grid, "=SUM(A1:A4)"), FormulaValue::Number(10.0));
        assert_eq!(eval_in(&grid, "=AVERAGE(A1:A2)"), FormulaValue::Number(5.0));
        // Blank and text cells are counted
        assert_eq!(eval_in(&grid, "=AVERAGE(A1:A4)"), FormulaValue::Number(2.5));
        assert_eq!(eval_in(&grid, "=AVERAGE(A1,A2,5)"), FormulaValue::Number(5.0));
        assert_eq!(eval_in(&grid, "=SUM(A1:A2)*2+1"), FormulaValue::Number(21.0));
    }

    #[test]
    fn test_ranges_clamp_to_grid() {
        let grid = Grid::from_values(&[vec!["4"], vec!["6"]]);
        assert_eq!(eval_in(&grid, "=SUM(A1:A10)"), FormulaValue::Number(10.0));
        assert_eq!(eval_in(&grid, "=SUM(C5:D9)"), FormulaValue::Number(0.0));
        // Out-of-grid rows still count toward the average
        assert_eq!(eval_in(&grid, "=AVERAGE(A1:A4)"), FormulaValue::Number(2.5));
    }

    #[test]
    fn test_out_of_bounds_reference() {
        let grid = Grid::from_values(&[
            vec!["1", "2", "3", "4"],
            vec!["1", "2", "3", "4"],
            vec!["1", "2", "3", "4"],
        ]);
        let value = eval_in(&grid, "=E1");
        assert_eq!(
            value,
            FormulaValue::Error(CellError::OutOfBounds {
                reference: CellAddress::new(0, 4),
                bounds: GridBounds::new(3, 4),
            })
        );
        assert_eq!(value.display(), "#ERROR!");
        assert!(eval_in(&grid, "=A9+1").is_error());
    }

    #[test]
    fn test_shape_and_arity_errors() {
        assert!(matches!(eval_str("=A1:B1"), FormulaValue::Error(CellError::Invalid(_))));
        assert!(matches!(eval_str("=SUM()"), FormulaValue::Error(CellError::Invalid(_))));
        assert!(matches!(eval_str("=1e308*10"), FormulaValue::Error(CellError::Invalid(_))));
    }

    #[test]
    fn test_errors_propagate_from_computed_cells() {
        let grid = Grid::from_values(&[vec!["=1/0", "=B1", "5"]]);
        let mut computed = AHashMap::new();
        computed.insert(
            CellAddress::new(0, 0),
            FormulaValue::Error(CellError::DivByZero),
        );
        computed.insert(CellAddress::new(0, 1), FormulaValue::Error(CellError::Circular));
        let ctx = EvaluationContext::new(&grid, &computed);

        let eval = |f: &str| evaluate(&parse_formula(f).unwrap(), &ctx);
        assert_eq!(eval("=A1+C1"), FormulaValue::Error(CellError::DivByZero));
        assert_eq!(eval("=SUM(A1:C1)"), FormulaValue::Error(CellError::DivByZero));
        assert_eq!(eval("=C1*B1"), FormulaValue::Error(CellError::Circular));
        assert_eq!(eval("=-B1"), FormulaValue::Error(CellError::Circular));
    }

    #[test]
    fn test_display() {
        assert_eq!(FormulaValue::Number(30.0).display(), "30");
        assert_eq!(FormulaValue::Number(0.1 + 0.2).display(), "0.30000000000000004");
        assert_eq!(FormulaValue::Number(-4.0).display(), "-4");
        assert_eq!(FormulaValue::Number(1e20).display(), "100000000000000000000");
        assert_eq!(FormulaValue::Error(CellError::DivByZero).display(), "#DIV/0!");
        assert_eq!(FormulaValue::Error(CellError::Circular).display(), "#CIRCULAR!");
    }
}
