//! JSON response envelope for transports

use crate::calculation::{CalculationStats, Evaluation};
use crate::{CellAddress, Grid, Row};
use gridcalc_formula::GraphStats;
use indexmap::IndexMap;
use serde::Serialize;

/// What a transport sends back for one evaluation request
///
/// `cell_errors` is keyed `"<row>-<column key>"` with a 0-based row index.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResponse {
    pub success: bool,
    pub data: Vec<Row>,
    pub cell_errors: IndexMap<String, String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CalculationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_info: Option<DependencyInfo>,
}

/// Graph details attached when graph info was collected
#[derive(Debug, Clone, Serialize)]
pub struct DependencyInfo {
    pub stats: GraphStatsReport,
    pub evaluation_order: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub has_cycles: bool,
}

/// Serializable form of [`GraphStats`]
#[derive(Debug, Clone, Serialize)]
pub struct GraphStatsReport {
    pub total_formulas: usize,
    pub total_dependencies: usize,
    pub max_dependencies: usize,
    pub max_dependents: usize,
    pub has_cycles: bool,
}

impl From<GraphStats> for GraphStatsReport {
    fn from(stats: GraphStats) -> Self {
        Self {
            total_formulas: stats.formula_count,
            total_dependencies: stats.edge_count,
            max_dependencies: stats.max_dependencies,
            max_dependents: stats.max_dependents,
            has_cycles: stats.has_cycles,
        }
    }
}

fn addresses(cells: &[CellAddress]) -> Vec<String> {
    cells.iter().map(ToString::to_string).collect()
}

impl EvaluationResponse {
    /// Build a successful response
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let grid = &evaluation.grid;
        let cell_errors = evaluation
            .errors
            .iter()
            .filter_map(|(addr, err)| {
                let key = grid.column_key(addr.col)?;
                Some((format!("{}-{}", addr.row, key), err.to_string()))
            })
            .collect();

        let message = if evaluation.errors.is_empty() {
            format!(
                "Evaluated {} formulas successfully",
                evaluation.stats.formula_count
            )
        } else {
            format!(
                "Evaluated {} formulas, {} with errors",
                evaluation.stats.formula_count,
                evaluation.errors.len()
            )
        };

        let dependency_info = evaluation.graph_stats.map(|stats| DependencyInfo {
            stats: stats.into(),
            evaluation_order: addresses(&evaluation.order),
            cycles: evaluation.cycles.iter().map(|c| addresses(c)).collect(),
            has_cycles: !evaluation.cycles.is_empty(),
        });

        Self {
            success: true,
            data: grid.rows().to_vec(),
            cell_errors,
            message,
            error: None,
            stats: Some(evaluation.stats.clone()),
            dependency_info,
        }
    }

    /// Build a failure response that echoes the input rows
    pub fn failure(input: Option<&Grid>, error: &crate::Error) -> Self {
        Self {
            success: false,
            data: input.map(|g| g.rows().to_vec()).unwrap_or_default(),
            cell_errors: IndexMap::new(),
            message: "Failed to evaluate formulas".to_string(),
            error: Some(error.to_string()),
            stats: None,
            dependency_info: None,
        }
    }
}
