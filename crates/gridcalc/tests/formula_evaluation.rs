//! Tests for grid-wide formula evaluation

use gridcalc::prelude::*;
use gridcalc::{evaluate, validate_formula, FormulaError, MAX_NESTING};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Grid with four addressable columns (A-D) and three rows
fn four_by_three(cells: &[(&str, &str)]) -> Grid {
    let mut grid = Grid::from_values(&[vec![""; 4], vec![""; 4], vec![""; 4]]);
    for (addr, value) in cells {
        grid.set(addr, *value).unwrap();
    }
    grid
}

/// Test the basic arithmetic example
#[test]
fn test_evaluate_addition() {
    let grid = four_by_three(&[("A1", "10"), ("B1", "20"), ("C1", "=A1+B1")]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("C1"), Some("30"));
    assert_eq!(evaluation.grid.get("C1").unwrap(), Some("30"));
    assert!(evaluation.is_clean());
}

/// Test SUM and AVERAGE with range references
#[test]
fn test_evaluate_with_range_references() {
    let grid = four_by_three(&[
        ("A1", "1"),
        ("A2", "2"),
        ("A3", "3"),
        ("B1", "=SUM(A1:A3)"),
        ("B2", "=AVERAGE(A2:A3)"),
        ("B3", "=AVERAGE(A1,A3)"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("B1"), Some("6"));
    assert_eq!(evaluation.value("B2"), Some("2.5"));
    assert_eq!(evaluation.value("B3"), Some("2"));
}

#[test]
fn test_average_example() {
    let grid = four_by_three(&[("A1", "4"), ("A2", "6"), ("B1", "=AVERAGE(A1:A2)")]);
    assert_eq!(evaluate(&grid).unwrap().value("B1"), Some("5"));
}

/// Test two-dimensional ranges: AVERAGE divides by rows x columns, including
/// cells past the grid edge, and SUM covers only the part inside the grid
#[test]
fn test_two_dimensional_ranges() {
    let grid = four_by_three(&[
        ("A1", "1"),
        ("B1", "2"),
        ("A2", "3"),
        ("B2", "4"),
        ("C2", "4"),
        ("D2", "8"),
        ("C3", "7"),
        ("D3", "=AVERAGE(A1:B2)"),
        ("A3", "=SUM(C2:F9)"),
        ("B3", "=AVERAGE(C2:E2)"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("D3"), Some("2.5"));
    assert_eq!(evaluation.value("A3"), Some("21.5"));
    assert_eq!(evaluation.value("B3"), Some("4"));
}

/// Test division by zero is a value, not a failure
#[test]
fn test_division_by_zero() {
    let grid = four_by_three(&[("A1", "10"), ("B1", "0"), ("C1", "=A1/B1")]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("C1"), Some("#DIV/0!"));
    assert_eq!(evaluation.error("C1"), Some(&CellError::DivByZero));
}

/// Test text and blank cells count as zero
#[test]
fn test_sum_skips_text_as_zero() {
    let grid = four_by_three(&[("A1", "abc"), ("A2", "5"), ("B1", "=SUM(A1:A2)")]);
    assert_eq!(evaluate(&grid).unwrap().value("B1"), Some("5"));

    let grid = four_by_three(&[("A1", "10"), ("B1", "=A1+A2*A3")]);
    assert_eq!(evaluate(&grid).unwrap().value("B1"), Some("10"));
}

/// Test a two-cell cycle is reported and does not stop the rest
#[test]
fn test_two_cell_cycle() {
    let grid = four_by_three(&[
        ("A1", "=B1"),
        ("B1", "=A1"),
        ("C1", "7"),
        ("D1", "=C1*3"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    for addr in ["A1", "B1"] {
        assert_eq!(evaluation.value(addr), Some("#CIRCULAR!"));
        let err = evaluation.error(addr).unwrap();
        assert_eq!(err, &CellError::Circular);
        assert_eq!(err.to_string(), "Circular dependency detected");
    }
    assert_eq!(evaluation.value("D1"), Some("21"));
    assert_eq!(
        evaluation.cycles,
        vec![vec![CellAddress::new(0, 0), CellAddress::new(0, 1)]]
    );
}

/// Test a longer cycle through a range, with a dependent outside it
#[test]
fn test_cycle_through_range_poisons_dependents() {
    let grid = four_by_three(&[
        ("A1", "=SUM(B1:B3)"),
        ("B2", "=C2+1"),
        ("C2", "=A1"),
        ("D3", "=C2*2"),
        ("D1", "=5+5"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.error("A1"), Some(&CellError::Circular));
    assert_eq!(evaluation.error("B2"), Some(&CellError::Circular));
    assert_eq!(evaluation.error("C2"), Some(&CellError::Circular));
    // Inherited, not part of the cycle
    assert_eq!(evaluation.error("D3"), Some(&CellError::Circular));
    assert_eq!(evaluation.stats.circular_references, 3);
    assert_eq!(evaluation.value("D1"), Some("10"));
}

/// Test a self-referencing formula
#[test]
fn test_self_reference() {
    let grid = four_by_three(&[("A1", "=A1+1")]);
    let evaluation = evaluate(&grid).unwrap();
    assert_eq!(evaluation.error("A1"), Some(&CellError::Circular));
}

/// Test error propagation through dependencies
#[test]
fn test_error_propagation() {
    let grid = four_by_three(&[
        ("A1", "=1/0"),
        ("B1", "=A1+5"),
        ("C1", "=SUM(A1:A3)"),
        ("A2", "=SUM(A1"),
        ("B2", "=A2*2"),
        ("C2", "=AVERAGE(B1,1)"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.error("B1"), Some(&CellError::DivByZero));
    assert_eq!(evaluation.error("C1"), Some(&CellError::DivByZero));
    assert_eq!(evaluation.error("C2"), Some(&CellError::DivByZero));

    let parse = CellError::Parse(FormulaError::MissingParen);
    assert_eq!(evaluation.error("A2"), Some(&parse));
    assert_eq!(evaluation.error("B2"), Some(&parse));
    assert_eq!(evaluation.value("B2"), Some("#ERROR!"));
}

/// Test a reference past the last column: invalid before saving, #ERROR! at runtime
#[test]
fn test_out_of_bounds_reference() {
    let grid = four_by_three(&[("A1", "=E1")]);

    let validation = validate_formula("=E1", Some(grid.bounds()));
    assert!(!validation.is_valid);
    assert_eq!(
        validation.error.as_deref(),
        Some("Column E does not exist (valid columns: A-D)")
    );

    let evaluation = evaluate(&grid).unwrap();
    assert_eq!(evaluation.value("A1"), Some("#ERROR!"));
    assert_eq!(
        evaluation.error("A1").map(ToString::to_string).as_deref(),
        Some("Reference E1 is out of bounds (valid range: A1:D3)")
    );
}

/// Test literal text is read by its leading number
#[test]
fn test_leading_number_coercion() {
    let grid = Grid::from_values(&[vec!["12abc", "10 kg", "$1,200", "=A1+B1", "=SUM(A1:C1)"]]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("D1"), Some("22"));
    assert_eq!(evaluation.value("E1"), Some("22"));
}

/// Test a formula nested past the limit fails alone
#[test]
fn test_deep_nesting_is_a_cell_error() {
    let deep = format!("={}1{}", "(".repeat(2000), ")".repeat(2000));
    let negations = format!("={}A1", "-".repeat(10_000));
    let grid = Grid::from_values(&[vec!["5", deep.as_str(), "=A1*2", negations.as_str()]]);
    let evaluation = evaluate(&grid).unwrap();

    let too_deep = CellError::Parse(FormulaError::TooDeep(MAX_NESTING));
    assert_eq!(evaluation.error("B1"), Some(&too_deep));
    assert_eq!(evaluation.value("B1"), Some("#ERROR!"));
    assert_eq!(evaluation.error("D1"), Some(&too_deep));
    assert_eq!(evaluation.value("C1"), Some("10"));
    assert_eq!(evaluation.stats.parse_errors, 2);
}

/// Test ranges running past the grid are clamped
#[test]
fn test_range_past_grid_is_clamped() {
    let grid = four_by_three(&[("A1", "1"), ("A2", "2"), ("A3", "3"), ("B1", "=SUM(A1:A99)")]);
    assert_eq!(evaluate(&grid).unwrap().value("B1"), Some("6"));
}

/// Test chained arithmetic follows precedence
#[test]
fn test_chained_arithmetic() {
    let grid = four_by_three(&[
        ("A1", "10"),
        ("B1", "4"),
        ("C1", "2"),
        ("D1", "=A1/B1-C1"),
        ("D2", "=SUM(A1:C1)+B1"),
        ("D3", "=(A1-B1)*-C1"),
    ]);
    let evaluation = evaluate(&grid).unwrap();

    assert_eq!(evaluation.value("D1"), Some("0.5"));
    assert_eq!(evaluation.value("D2"), Some("20"));
    assert_eq!(evaluation.value("D3"), Some("-12"));
}

/// Test renaming column titles leaves addressing alone
#[test]
fn test_addressing_is_positional() {
    let columns = vec![
        ColumnDef::identifier(),
        ColumnDef::new("c1", "Hours"),
        ColumnDef::new("c2", "A"),
        ColumnDef::new("c3", "Total"),
    ];
    let rows = vec![Row::from_iter([
        ("id", "1"),
        ("c1", "8"),
        ("c2", "2"),
        ("c3", "=A1*B1"),
    ])];
    let grid = Grid::new(columns, rows).unwrap();

    let evaluation = evaluate(&grid).unwrap();
    assert_eq!(evaluation.grid.rows()[0].get("c3"), Some("16"));
}

/// Test the input grid is not modified
#[test]
fn test_input_is_untouched() {
    let grid = four_by_three(&[("A1", "2"), ("B1", "=A1*A1")]);
    let before = grid.clone();
    let evaluation = grid.calculate().unwrap();

    assert_eq!(grid, before);
    assert_eq!(grid.get("B1").unwrap(), Some("=A1*A1"));
    assert_eq!(evaluation.grid.get("B1").unwrap(), Some("4"));
}

/// Test evaluation order respects dependencies
#[test]
fn test_evaluation_order() {
    let grid = four_by_three(&[
        ("A1", "=B2+C3"),
        ("B2", "=C3*2"),
        ("C3", "1"),
        ("D1", "=A1"),
    ]);
    let options = CalculationOptions {
        collect_graph_info: true,
        ..Default::default()
    };
    let evaluation = grid.calculate_with_options(&options).unwrap();

    let order: Vec<String> = evaluation.order.iter().map(ToString::to_string).collect();
    assert_eq!(order, vec!["B2", "A1", "D1"]);
    assert_eq!(evaluation.value("D1"), Some("3"));

    let stats = evaluation.graph_stats.unwrap();
    assert_eq!(stats.formula_count, 3);
    assert!(!stats.has_cycles);
}

/// Cell content drawn from literals and a small set of formulas over A1:C3
fn cell_content() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("abc".to_string()),
        (-100i32..100).prop_map(|n| n.to_string()),
        (0usize..9, 0usize..9).prop_map(|(a, b)| {
            let cells = ["A1", "B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"];
            format!("={}+{}", cells[a], cells[b])
        }),
        (0usize..9).prop_map(|a| {
            let cells = ["A1", "B1", "C1", "A2", "B2", "C2", "A3", "B3", "C3"];
            format!("=SUM(A1:{})/{}", cells[a], a)
        }),
    ]
}

proptest! {
    #[test]
    fn prop_evaluation_is_deterministic(cells in proptest::collection::vec(cell_content(), 9)) {
        let rows: Vec<Vec<String>> = cells.chunks(3).map(|c| c.to_vec()).collect();
        let grid = Grid::from_values(&rows);

        let first = evaluate(&grid).unwrap();
        let second = evaluate(&grid).unwrap();

        prop_assert_eq!(&first.grid, &second.grid);
        prop_assert_eq!(&first.results, &second.results);
        prop_assert_eq!(&first.errors, &second.errors);
        prop_assert_eq!(&first.cycles, &second.cycles);

        // Every formula cell gets exactly one result
        prop_assert_eq!(first.results.len(), grid.formula_cells().count());
    }
}
