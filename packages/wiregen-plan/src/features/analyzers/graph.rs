//! Service dependency graph
//!
//! Directed graph over the injectable population:
//! - Nodes are registered concrete types
//! - An edge A -> B means A's registration constructor consumes a contract
//!   that B registers (B may be one of several implementers)
//!
//! Contract resolution goes through the implementer index, which also maps
//! every concrete type to itself so plain class injection forms edges too.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;

use crate::shared::models::{
    InjectableDescriptor, Lifetime, ParamKind, SourceLocation, TypeId,
};

/// How a dependency edge is satisfied at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Built eagerly while constructing the consumer; cycle-forming.
    Construct,
    /// Resolved on first use (deferred wrappers, factories); breaks cycles
    /// but still pins the dependency's lifetime to the consumer.
    Deferred,
}

/// Per-node facts the analyzers read off an edge endpoint.
#[derive(Debug, Clone)]
pub struct NodeFacts {
    pub lifetime: Option<Lifetime>,
    pub is_disposable: bool,
    pub location: SourceLocation,
}

pub struct ServiceGraph {
    graph: DiGraph<TypeId, EdgeKind>,
    node_of: FxHashMap<TypeId, NodeIndex>,
    facts: FxHashMap<TypeId, NodeFacts>,
    /// Contract display -> implementing type ids, sorted. Covers implemented
    /// contracts plus collection and factory provisions.
    implementers: FxHashMap<String, Vec<TypeId>>,
}

impl ServiceGraph {
    /// Build the graph from a resolved injectable population.
    ///
    /// Input order does not matter: nodes are added in sorted order and the
    /// implementer index is sorted, so edge enumeration is deterministic.
    pub fn build(injectables: &[InjectableDescriptor]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of = FxHashMap::default();
        let mut facts = FxHashMap::default();
        let mut implementers: FxHashMap<String, Vec<TypeId>> = FxHashMap::default();

        let mut sorted: Vec<&InjectableDescriptor> = injectables.iter().collect();
        sorted.sort_by(|a, b| a.type_id.cmp(&b.type_id));

        for descriptor in &sorted {
            let idx = graph.add_node(descriptor.type_id.clone());
            node_of.insert(descriptor.type_id.clone(), idx);
            facts.insert(
                descriptor.type_id.clone(),
                NodeFacts {
                    lifetime: descriptor.lifetime,
                    is_disposable: descriptor.is_disposable,
                    location: descriptor.location.clone(),
                },
            );

            // Concrete identity is always resolvable.
            implementers
                .entry(descriptor.type_id.to_string())
                .or_default()
                .push(descriptor.type_id.clone());
            let provided = descriptor
                .contracts
                .iter()
                .chain(&descriptor.provisions.collection)
                .chain(&descriptor.provisions.factory);
            for contract in provided {
                implementers
                    .entry(contract.display())
                    .or_default()
                    .push(descriptor.type_id.clone());
            }
        }
        for ids in implementers.values_mut() {
            ids.sort();
            ids.dedup();
        }

        for descriptor in &sorted {
            let from = node_of[&descriptor.type_id];
            for param in &descriptor.dependencies {
                let (contract, kind) = match &param.kind {
                    ParamKind::Service(c) | ParamKind::Collection(c) => (c, EdgeKind::Construct),
                    ParamKind::Deferred(c) | ParamKind::Factory(c) => (c, EdgeKind::Deferred),
                    ParamKind::Scalar(_) => continue,
                };
                let Some(targets) = implementers.get(&contract.display()) else {
                    continue;
                };
                for target in targets {
                    graph.add_edge(from, node_of[target], kind);
                }
            }
        }

        Self {
            graph,
            node_of,
            facts,
            implementers,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn facts(&self, id: &TypeId) -> Option<&NodeFacts> {
        self.facts.get(id)
    }

    /// Implementers of a contract display name, empty when unregistered.
    pub fn implementers_of(&self, contract: &str) -> &[TypeId] {
        self.implementers
            .get(contract)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Node ids in deterministic (sorted) order.
    pub fn nodes(&self) -> Vec<TypeId> {
        let mut ids: Vec<TypeId> = self.node_of.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Outgoing dependency edges of a node as (target, kind) pairs, in a
    /// deterministic order.
    pub fn edges_of(&self, id: &TypeId) -> Vec<(TypeId, EdgeKind)> {
        let Some(&idx) = self.node_of.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(TypeId, EdgeKind)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()].clone(), *e.weight()))
            .collect();
        edges.sort_by(|a, b| a.0.cmp(&b.0));
        edges
    }

    /// Direct dependency type ids, sorted, construct edges only.
    pub fn construct_dependencies(&self, id: &TypeId) -> Vec<TypeId> {
        let mut deps: Vec<TypeId> = self
            .edges_of(id)
            .into_iter()
            .filter(|(_, kind)| *kind == EdgeKind::Construct)
            .map(|(target, _)| target)
            .collect();
        deps.dedup();
        deps
    }

    /// All dependency type ids regardless of edge kind, sorted.
    pub fn dependencies(&self, id: &TypeId) -> Vec<TypeId> {
        let mut deps: Vec<TypeId> = self.edges_of(id).into_iter().map(|(t, _)| t).collect();
        deps.dedup();
        deps
    }
}
