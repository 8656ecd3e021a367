//! Dependency tracking for formula calculation

use ahash::{AHashMap, AHashSet};
use gridcalc_core::CellAddress;
use std::collections::{BTreeMap, BTreeSet};

/// Dependency graph for formula cells
///
/// Nodes are formula cells. Edges run from a formula to each in-grid cell it
/// reads (its precedents), which may or may not be formulas themselves. All
/// maps are ordered so that traversal, and therefore evaluation order, is the
/// same for the same grid.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Formula cells
    formulas: BTreeSet<CellAddress>,
    /// Cell → Cells that depend on it (dependents)
    dependents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
    /// Cell → Cells it depends on (precedents)
    precedents: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
}

/// Cycles and evaluation order for a graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphAnalysis {
    /// Acyclic formula cells, every cell after all of its precedents
    pub order: Vec<CellAddress>,
    /// Reference cycles, each sorted row-major, in discovery order
    pub cycles: Vec<Vec<CellAddress>>,
}

impl GraphAnalysis {
    /// Every cell that belongs to some cycle
    pub fn cyclic_cells(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.cycles.iter().flatten().copied()
    }
}

/// Summary numbers for a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Number of formula cells
    pub formula_count: usize,
    /// Number of distinct dependency edges
    pub edge_count: usize,
    /// Largest number of precedents of one formula
    pub max_dependencies: usize,
    /// Largest number of dependents of one cell
    pub max_dependents: usize,
    /// Whether any cycle exists
    pub has_cycles: bool,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formula cell, even if it reads nothing
    pub fn add_formula(&mut self, cell: CellAddress) {
        self.formulas.insert(cell);
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellAddress, dependent: CellAddress) {
        self.formulas.insert(dependent);
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Check if a cell is a formula node
    pub fn is_formula(&self, cell: CellAddress) -> bool {
        self.formulas.contains(&cell)
    }

    /// Formula cells in row-major order
    pub fn formulas(&self) -> impl Iterator<Item = CellAddress> + '_ {
        self.formulas.iter().copied()
    }

    /// Get cells that depend on the given cell
    pub fn get_dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on
    pub fn get_precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Precedents that are themselves formulas
    fn formula_precedents(&self, cell: CellAddress) -> Vec<CellAddress> {
        self.get_precedents(cell)
            .filter(|p| self.formulas.contains(p))
            .collect()
    }

    /// Detect circular references involving a cell
    pub fn has_circular_reference(&self, cell: CellAddress) -> bool {
        let mut visited = AHashSet::new();
        let mut stack = self.formula_precedents(cell);

        while let Some(next) = stack.pop() {
            if next == cell {
                return true;
            }
            if visited.insert(next) {
                stack.extend(self.formula_precedents(next));
            }
        }
        false
    }

    /// Find cycles and the evaluation order in one pass
    ///
    /// Strongly connected components are found with an iterative Tarjan walk
    /// that starts from formulas in row-major order. Components come out with
    /// their precedents first, so the acyclic singletons in emission order are
    /// a valid evaluation order. A component of two or more cells, or a cell
    /// that reads itself, is a cycle.
    pub fn analyze(&self) -> GraphAnalysis {
        struct Frame {
            node: CellAddress,
            successors: Vec<CellAddress>,
            next: usize,
        }

        let mut analysis = GraphAnalysis::default();
        let mut index_of: AHashMap<CellAddress, usize> = AHashMap::new();
        let mut lowlink: AHashMap<CellAddress, usize> = AHashMap::new();
        let mut on_stack: AHashSet<CellAddress> = AHashSet::new();
        let mut stack: Vec<CellAddress> = Vec::new();
        let mut calls: Vec<Frame> = Vec::new();
        let mut next_index = 0usize;

        for root in self.formulas.iter().copied() {
            if index_of.contains_key(&root) {
                continue;
            }

            index_of.insert(root, next_index);
            lowlink.insert(root, next_index);
            next_index += 1;
            stack.push(root);
            on_stack.insert(root);
            calls.push(Frame {
                node: root,
                successors: self.formula_precedents(root),
                next: 0,
            });

            while let Some(frame) = calls.last_mut() {
                let node = frame.node;

                if frame.next < frame.successors.len() {
                    let succ = frame.successors[frame.next];
                    frame.next += 1;

                    if let Some(&succ_index) = index_of.get(&succ) {
                        if on_stack.contains(&succ) {
                            let low = lowlink.entry(node).or_insert(succ_index);
                            *low = (*low).min(succ_index);
                        }
                    } else {
                        index_of.insert(succ, next_index);
                        lowlink.insert(succ, next_index);
                        next_index += 1;
                        stack.push(succ);
                        on_stack.insert(succ);
                        calls.push(Frame {
                            node: succ,
                            successors: self.formula_precedents(succ),
                            next: 0,
                        });
                    }
                    continue;
                }

                // All successors visited
                calls.pop();
                let node_low = lowlink.get(&node).copied().unwrap_or(0);
                if let Some(parent) = calls.last() {
                    let low = lowlink.entry(parent.node).or_insert(node_low);
                    *low = (*low).min(node_low);
                }

                if index_of.get(&node) == Some(&node_low) {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack.remove(&member);
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }

                    let self_loop = self
                        .precedents
                        .get(&node)
                        .map_or(false, |p| p.contains(&node));
                    if component.len() > 1 || self_loop {
                        component.sort();
                        analysis.cycles.push(component);
                    } else {
                        analysis.order.push(node);
                    }
                }
            }
        }

        analysis
    }

    /// Summary statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            formula_count: self.formulas.len(),
            edge_count: self.precedents.values().map(BTreeSet::len).sum(),
            max_dependencies: self.precedents.values().map(BTreeSet::len).max().unwrap_or(0),
            max_dependents: self.dependents.values().map(BTreeSet::len).max().unwrap_or(0),
            has_cycles: !self.analyze().cycles.is_empty(),
        }
    }
}
