//! Whole-graph diagnostic analyzers (stage 6)
//!
//! Read-only pass over the resolved descriptor set. Analyzers build the
//! service dependency graph once and report findings through the shared
//! coded channel; they never mutate descriptors.

mod collections;
mod cycles;
mod graph;
mod lifetimes;

pub use collections::CollectionAnalyzer;
pub use cycles::CircularDependencyAnalyzer;
pub use graph::{EdgeKind, NodeFacts, ServiceGraph};
pub use lifetimes::LifetimeMismatchAnalyzer;

use tracing::debug;

use crate::config::AnalyzerControl;
use crate::errors::Result;
use crate::shared::cancel::CancelToken;
use crate::shared::models::{Finding, InjectableDescriptor};

/// Runs the enabled analyzers over one resolved descriptor set.
pub struct DiagnosticAnalyzers;

impl DiagnosticAnalyzers {
    pub fn run(
        injectables: &[InjectableDescriptor],
        control: &AnalyzerControl,
        cancel: &CancelToken,
    ) -> Result<Vec<Finding>> {
        let graph = ServiceGraph::build(injectables);
        let mut findings = Vec::new();

        if control.cycles {
            findings.extend(CircularDependencyAnalyzer::analyze(&graph, cancel)?);
        }
        if control.lifetimes || control.captive {
            findings.extend(LifetimeMismatchAnalyzer::analyze(
                &graph,
                control.lifetimes,
                control.captive,
                cancel,
            )?);
        }
        if control.collections {
            findings.extend(CollectionAnalyzer::analyze(injectables, &graph, cancel)?);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            findings = findings.len(),
            "graph analysis finished"
        );
        Ok(findings)
    }
}
