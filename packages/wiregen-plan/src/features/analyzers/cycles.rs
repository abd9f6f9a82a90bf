//! Circular constructor dependency detection
//!
//! Three-color depth-first search over construct edges. Deferred and factory
//! edges are skipped: they resolve after construction and cannot deadlock it.
//! Only the first cycle is reported; roots are visited in sorted order, so
//! the reported cycle is the same on every run.

use rustc_hash::FxHashMap;

use crate::errors::{PlanError, Result};
use crate::shared::cancel::CancelToken;
use crate::shared::models::{DiagnosticCode, Finding, SourceLocation, TypeId};

use super::graph::ServiceGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub struct CircularDependencyAnalyzer;

impl CircularDependencyAnalyzer {
    /// Walk the graph and report the first construct cycle as an ordered
    /// chain, `A -> B -> A`. Returns at most one finding.
    pub fn analyze(graph: &ServiceGraph, cancel: &CancelToken) -> Result<Vec<Finding>> {
        let mut colors: FxHashMap<TypeId, Color> = FxHashMap::default();
        let mut path: Vec<TypeId> = Vec::new();

        for (completed, root) in graph.nodes().into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            if color_of(&colors, &root) != Color::White {
                continue;
            }
            if let Some(cycle) = visit(graph, &root, &mut colors, &mut path) {
                let chain = cycle
                    .iter()
                    .map(TypeId::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                let location = graph
                    .facts(&cycle[0])
                    .map(|f| f.location.clone())
                    .unwrap_or_else(SourceLocation::unknown);
                return Ok(vec![Finding::new(
                    DiagnosticCode::CircularDependency,
                    &[&chain],
                    location,
                )]);
            }
        }
        Ok(Vec::new())
    }
}

fn color_of(colors: &FxHashMap<TypeId, Color>, id: &TypeId) -> Color {
    colors.get(id).copied().unwrap_or(Color::White)
}

/// Recursive step. `path` holds the gray chain from the current root; on a
/// gray hit the cycle is the path suffix from that node, closed by repeating
/// it.
fn visit(
    graph: &ServiceGraph,
    node: &TypeId,
    colors: &mut FxHashMap<TypeId, Color>,
    path: &mut Vec<TypeId>,
) -> Option<Vec<TypeId>> {
    colors.insert(node.clone(), Color::Gray);
    path.push(node.clone());

    for next in graph.construct_dependencies(node) {
        match color_of(colors, &next) {
            Color::Black => {}
            Color::Gray => {
                let start = path.iter().position(|id| id == &next).unwrap_or(0);
                let mut cycle: Vec<TypeId> = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Color::White => {
                if let Some(cycle) = visit(graph, &next, colors, path) {
                    return Some(cycle);
                }
            }
        }
    }

    path.pop();
    colors.insert(node.clone(), Color::Black);
    None
}
