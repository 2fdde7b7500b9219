use std::collections::BTreeSet;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::GraphError;
use crate::tree::NodeId;

/// Why one node must exist before another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    /// Declared ordering, synthesized as `DependsOn`
    Explicit,
    /// Implied by a `Ref` / `Fn::GetAtt` in the dependent's properties
    Reference,
}

/// Directed acyclic graph over construct nodes
///
/// An edge `from -> to` means `from` must be deployed before `to`.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    inner: DiGraphMap<NodeId, EdgeKind>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node_id: NodeId) {
        self.inner.add_node(node_id);
    }

    /// Add `from -> to`, rejecting self loops and edges that would close a cycle
    ///
    /// Re-adding an existing edge keeps the strongest kind: an explicit edge
    /// is never downgraded to a reference edge.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }

        if let Some(existing) = self.inner.edge_weight_mut(from, to) {
            *existing = (*existing).min(kind);
            return Ok(());
        }

        if self.inner.contains_node(from)
            && self.inner.contains_node(to)
            && has_path_connecting(&self.inner, to, from, None)
        {
            return Err(GraphError::CycleDetected(format!("{to} already reaches {from}")));
        }

        self.inner.add_edge(from, to, kind);
        Ok(())
    }

    pub fn edge_kind(&self, from: NodeId, to: NodeId) -> Option<EdgeKind> {
        self.inner.edge_weight(from, to).copied()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// All edges as `(from, to, kind)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, EdgeKind)> + '_ {
        self.inner.all_edges().map(|(a, b, k)| (a, b, *k))
    }

    /// Nodes that must be deployed before `node_id`
    pub fn dependencies_of(&self, node_id: NodeId) -> BTreeSet<NodeId> {
        if !self.inner.contains_node(node_id) {
            return BTreeSet::new();
        }
        self.inner
            .neighbors_directed(node_id, Direction::Incoming)
            .collect()
    }

    /// Validate the entire graph structure
    pub fn validate(&self) -> Result<(), GraphError> {
        if petgraph::algo::is_cyclic_directed(&self.inner) {
            return Err(GraphError::CycleDetected("graph contains a cycle".to_string()));
        }
        Ok(())
    }

    /// Get topological sort of nodes (for scheduling)
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, GraphError> {
        toposort(&self.inner, None)
            .map_err(|cycle| GraphError::CycleDetected(format!("cycle through {}", cycle.node_id())))
    }

    /// Topological order with ties broken by `key`
    ///
    /// Kahn's algorithm over an ordered ready set, so the result only depends
    /// on the graph and the key, never on insertion order.
    pub fn ordered_topological_sort<K, F>(&self, key: F) -> Result<Vec<NodeId>, GraphError>
    where
        K: Ord,
        F: Fn(NodeId) -> K,
    {
        let mut in_degree: std::collections::HashMap<NodeId, usize> = self
            .inner
            .nodes()
            .map(|n| (n, self.inner.neighbors_directed(n, Direction::Incoming).count()))
            .collect();

        let mut ready: BTreeSet<(K, NodeId)> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| (key(*n), *n))
            .collect();

        let mut order = Vec::with_capacity(self.inner.node_count());
        while let Some(entry) = ready.pop_first() {
            let node = entry.1;
            order.push(node);
            for next in self.inner.neighbors_directed(node, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((key(next), next));
                    }
                }
            }
        }

        if order.len() != self.inner.node_count() {
            return Err(GraphError::CycleDetected(format!(
                "{} node(s) left unordered",
                self.inner.node_count() - order.len()
            )));
        }
        Ok(order)
    }

    /// Get nodes with no predecessors (entry points)
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.inner
            .nodes()
            .filter(|n| self.inner.neighbors_directed(*n, Direction::Incoming).next().is_none())
            .collect()
    }

    /// Get nodes with no successors (exit points)
    pub fn exit_nodes(&self) -> Vec<NodeId> {
        self.inner
            .nodes()
            .filter(|n| self.inner.neighbors_directed(*n, Direction::Outgoing).next().is_none())
            .collect()
    }
}
