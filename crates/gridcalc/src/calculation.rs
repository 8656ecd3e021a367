//! Grid calculation engine
//!
//! Evaluates every formula in a grid snapshot with dependency tracking and
//! circular reference detection. Each call builds its own engine, graph and
//! parse cache; nothing is shared between calls.
//!
//! # Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let grid = Grid::from_values(&[
//!     vec!["10", "20", "=A1+B1"],
//!     vec!["=C1*2", "=A2/0", "=B2+1"],
//! ]);
//!
//! let evaluation = grid.calculate().unwrap();
//! assert_eq!(evaluation.value("C1"), Some("30"));
//! assert_eq!(evaluation.value("A2"), Some("60"));
//! assert_eq!(evaluation.value("B2"), Some("#DIV/0!"));
//! assert_eq!(evaluation.value("C2"), Some("#DIV/0!"));
//! println!("Calculated {} cells", evaluation.stats.cells_calculated);
//! ```

use crate::{CellAddress, CellError, Grid, Result};
use ahash::AHashMap;
use gridcalc_formula::{
    evaluate as evaluate_expr, parse_formula_with, DependencyGraph, EvaluationContext,
    FormulaError, FormulaExpr, FormulaValue, GraphStats, Grammar, Reference,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Options for grid calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Formula grammar to accept
    pub grammar: Grammar,
    /// Keep the evaluation order, cycles and graph statistics in the result
    pub collect_graph_info: bool,
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells evaluated in dependency order
    pub cells_calculated: usize,
    /// Number of cells that are part of a reference cycle
    pub circular_references: usize,
    /// Number of formulas that failed to parse
    pub parse_errors: usize,
    /// Number of formula cells whose result is an error
    pub errors: usize,
}

/// Result of evaluating a grid
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Output snapshot: every formula cell replaced by its display value
    pub grid: Grid,
    /// Display value of every formula cell
    pub results: BTreeMap<CellAddress, String>,
    /// Error of every formula cell that did not produce a number
    pub errors: BTreeMap<CellAddress, CellError>,
    /// Evaluation order of the acyclic formula cells
    pub order: Vec<CellAddress>,
    /// Reference cycles
    pub cycles: Vec<Vec<CellAddress>>,
    /// Run statistics
    pub stats: CalculationStats,
    /// Graph statistics, when requested
    pub graph_stats: Option<GraphStats>,
}

impl Evaluation {
    /// Display value of a formula cell by A1 address
    pub fn value(&self, address: &str) -> Option<&str> {
        let addr = CellAddress::parse(address).ok()?;
        self.results.get(&addr).map(String::as_str)
    }

    /// Error of a formula cell by A1 address
    pub fn error(&self, address: &str) -> Option<&CellError> {
        let addr = CellAddress::parse(address).ok()?;
        self.errors.get(&addr)
    }

    /// Check if every formula produced a number
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Evaluate all formulas in a grid with default options
pub fn evaluate(grid: &Grid) -> Result<Evaluation> {
    evaluate_with_options(grid, &CalculationOptions::default())
}

/// Evaluate all formulas in a grid
pub fn evaluate_with_options(grid: &Grid, options: &CalculationOptions) -> Result<Evaluation> {
    let mut engine = CalculationEngine::new(options.clone());
    engine.calculate_all(grid)
}

/// Extension trait for Grid to add calculation methods
pub trait GridCalculationExt {
    /// Calculate all formulas in the grid with default options
    fn calculate(&self) -> Result<Evaluation>;

    /// Calculate all formulas with custom options
    fn calculate_with_options(&self, options: &CalculationOptions) -> Result<Evaluation>;
}

impl GridCalculationExt for Grid {
    fn calculate(&self) -> Result<Evaluation> {
        self.calculate_with_options(&CalculationOptions::default())
    }

    fn calculate_with_options(&self, options: &CalculationOptions) -> Result<Evaluation> {
        evaluate_with_options(self, options)
    }
}

/// The calculation engine
struct CalculationEngine {
    options: CalculationOptions,
    /// Dependency graph built from formulas
    dependency_graph: DependencyGraph,
    /// Parsed formula ASTs, or the parse failure
    parsed_formulas: AHashMap<CellAddress, std::result::Result<FormulaExpr, FormulaError>>,
}

impl CalculationEngine {
    fn new(options: CalculationOptions) -> Self {
        Self {
            options,
            dependency_graph: DependencyGraph::new(),
            parsed_formulas: AHashMap::new(),
        }
    }

    /// Calculate all formulas in the grid
    fn calculate_all(&mut self, grid: &Grid) -> Result<Evaluation> {
        let mut stats = CalculationStats::default();

        // Phase 1: Collect and parse all formulas, build dependency graph
        self.collect_formulas(grid, &mut stats);

        // Phase 2: Detect cycles and order the rest
        let analysis = self.dependency_graph.analyze();
        let mut computed: AHashMap<CellAddress, FormulaValue> = AHashMap::new();
        for cycle in &analysis.cycles {
            warn!(
                "Circular dependency between {}",
                cycle
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for &cell in cycle {
                computed.insert(cell, FormulaValue::Error(CellError::Circular));
            }
        }
        stats.circular_references = computed.len();

        // Phase 3: Calculate cells in order
        for &cell in &analysis.order {
            let value = match self.parsed_formulas.get(&cell) {
                Some(Ok(ast)) => {
                    let ctx = EvaluationContext::new(grid, &computed);
                    evaluate_expr(ast, &ctx)
                }
                Some(Err(e)) => FormulaValue::Error(CellError::Parse(e.clone())),
                None => continue,
            };
            debug!("{} = {}", cell, value.display());
            computed.insert(cell, value);
            stats.cells_calculated += 1;
        }

        // Phase 4: Write results into the output snapshot
        let mut output = grid.clone();
        let mut results = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for cell in self.dependency_graph.formulas() {
            let value = match computed.remove(&cell) {
                Some(value) => value,
                None => continue,
            };
            let display = value.display();
            output.set_raw(cell, display.clone())?;
            results.insert(cell, display);
            if let FormulaValue::Error(e) = value {
                errors.insert(cell, e);
            }
        }
        stats.errors = errors.len();

        info!(
            "Evaluated {} formulas ({} calculated, {} circular, {} errors)",
            stats.formula_count, stats.cells_calculated, stats.circular_references, stats.errors
        );

        let collect = self.options.collect_graph_info;
        Ok(Evaluation {
            grid: output,
            results,
            errors,
            order: if collect { analysis.order } else { Vec::new() },
            cycles: analysis.cycles,
            stats,
            graph_stats: collect.then(|| self.dependency_graph.stats()),
        })
    }

    /// Collect all formulas from the grid and build the dependency graph
    fn collect_formulas(&mut self, grid: &Grid, stats: &mut CalculationStats) {
        let bounds = grid.bounds();

        for (cell, formula_text) in grid.formula_cells() {
            self.dependency_graph.add_formula(cell);
            stats.formula_count += 1;

            let ast = match parse_formula_with(formula_text, self.options.grammar) {
                Ok(ast) => ast,
                Err(e) => {
                    warn!("Failed to parse formula at {}: {}", cell, e);
                    stats.parse_errors += 1;
                    self.parsed_formulas.insert(cell, Err(e));
                    continue;
                }
            };

            // Only in-grid cells become edges; the evaluator reports the rest
            for reference in ast.references() {
                match reference {
                    Reference::Cell(addr) if bounds.contains(&addr) => {
                        self.dependency_graph.add_dependency(addr, cell);
                    }
                    Reference::Cell(addr) => {
                        debug!("{} references {} outside {}", cell, addr, bounds);
                    }
                    Reference::Range(range) => {
                        if let Some(clamped) = range.clamp(bounds) {
                            for addr in clamped.cells() {
                                self.dependency_graph.add_dependency(addr, cell);
                            }
                        }
                    }
                }
            }

            self.parsed_formulas.insert(cell, Ok(ast));
        }
    }
}
