//! Aggregate math functions

use super::Aggregate;
use crate::error::CellError;
use crate::evaluator::FormulaValue;

/// SUM function
pub fn fn_sum(args: &[Aggregate]) -> FormulaValue {
    let sum: f64 = args.iter().map(|a| a.sum).sum();
    FormulaValue::checked(sum)
}

/// AVERAGE function
///
/// Divides by the number of addressed cells, so blanks and text count as
/// zero-valued members rather than being skipped.
pub fn fn_average(args: &[Aggregate]) -> FormulaValue {
    let sum: f64 = args.iter().map(|a| a.sum).sum();
    let count: u64 = args.iter().map(|a| a.count).sum();

    if count == 0 {
        return FormulaValue::Error(CellError::invalid("AVERAGE over zero cells"));
    }
    FormulaValue::checked(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let args = [
            Aggregate { sum: 6.0, count: 3 },
            Aggregate::scalar(4.0),
        ];
        assert_eq!(fn_sum(&args), FormulaValue::Number(10.0));
        assert_eq!(fn_sum(&[]), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_average_counts_addressed_cells() {
        // A1:A4 holding 4, 6, blank, text
        let args = [Aggregate { sum: 10.0, count: 4 }];
        assert_eq!(fn_average(&args), FormulaValue::Number(2.5));
    }

    #[test]
    fn test_average_of_nothing() {
        assert!(fn_average(&[]).is_error());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let args = [Aggregate::scalar(f64::MAX), Aggregate::scalar(f64::MAX)];
        assert!(fn_sum(&args).is_error());
    }
}
