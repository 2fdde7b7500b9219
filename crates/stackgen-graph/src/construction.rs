//! Graph construction and validation
//!
//! [`GraphBuilder`] collects constructs and declared edges while a stack is
//! being assembled. [`GraphBuilder::validate`] is the only way to obtain a
//! [`ValidatedGraph`]: it expands construct-level edges into resource-level
//! edges, proves the result acyclic and fixes a deterministic deployment
//! order. Synthesis only ever reads a `ValidatedGraph`.

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};

use crate::dag::{Dag, EdgeKind};
use crate::error::GraphError;
use crate::path::ConstructPath;
use crate::tree::{ConstructTree, NodeId, NodeKind};

/// Builder for constructing validated graphs
///
/// Usage:
/// ```rust,ignore
/// let mut builder = GraphBuilder::new("EcsStack")?;
/// let a = builder.add_node(builder.tree().root(), "A", NodeKind::Resource)?;
/// let b = builder.add_node(builder.tree().root(), "B", NodeKind::Resource)?;
/// builder.add_dependency(b, a, EdgeKind::Explicit)?;
/// let validated: ValidatedGraph = builder.validate()?;
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    tree: ConstructTree,
    declared: Dag,
}

impl GraphBuilder {
    /// Create a builder whose root is the stack `stack_id`
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidId`] for an unusable stack id
    pub fn new(stack_id: &str) -> Result<Self, GraphError> {
        Ok(Self {
            tree: ConstructTree::new(stack_id)?,
            declared: Dag::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    /// Edges as declared, before expansion
    #[inline]
    #[must_use]
    pub fn declared(&self) -> &Dag {
        &self.declared
    }

    /// Add a construct under `parent`
    ///
    /// # Errors
    /// See [`ConstructTree::add_child`]
    pub fn add_node(
        &mut self,
        parent: NodeId,
        id: &str,
        kind: NodeKind,
    ) -> Result<NodeId, GraphError> {
        let node = self.tree.add_child(parent, id, kind)?;
        self.declared.add_node(node);
        Ok(node)
    }

    /// Declare that `dependent` must be deployed after `dependency`
    ///
    /// # Errors
    /// - [`GraphError::NodeNotFound`] if either node is unknown
    /// - [`GraphError::SelfLoop`] if both are the same node
    /// - [`GraphError::NestedDependency`] if one contains the other
    /// - [`GraphError::CycleDetected`] if the edge would close a cycle
    pub fn add_dependency(
        &mut self,
        dependent: NodeId,
        dependency: NodeId,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        if dependent == dependency {
            return Err(GraphError::SelfLoop(dependent));
        }
        let dependent_path = self.tree.path(dependent)?;
        let dependency_path = self.tree.path(dependency)?;
        if dependent_path.overlaps(dependency_path) {
            return Err(GraphError::NestedDependency {
                dependent: dependent_path.to_string(),
                dependency: dependency_path.to_string(),
            });
        }

        self.declared
            .add_edge(dependency, dependent, kind)
            .map_err(|e| match e {
                GraphError::CycleDetected(_) => GraphError::CycleDetected(format!(
                    "'{dependent_path}' -> '{dependency_path}' closes a cycle"
                )),
                other => other,
            })?;

        tracing::debug!(
            dependent = %dependent_path,
            dependency = %dependency_path,
            ?kind,
            "dependency declared"
        );
        Ok(())
    }

    /// Declared dependencies of `node_id`
    #[must_use]
    pub fn dependencies_of(&self, node_id: NodeId) -> BTreeSet<NodeId> {
        self.declared.dependencies_of(node_id)
    }

    /// Validate the graph and produce a [`ValidatedGraph`]
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if the expanded resource graph
    /// contains a cycle.
    pub fn validate(&self) -> Result<ValidatedGraph, GraphError> {
        self.declared.validate()?;

        let mut resources = Dag::new();
        for node in self.tree.iter() {
            if node.kind() == NodeKind::Resource {
                resources.add_node(node.id());
            }
        }

        let mut explicit: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        let mut declared_edges: Vec<(NodeId, NodeId, EdgeKind)> = self.declared.edges().collect();
        declared_edges.sort();

        for (dependency, dependent, kind) in declared_edges {
            let before = self.tree.resources_under(dependency)?;
            let after = self.tree.resources_under(dependent)?;
            for &a in &after {
                for &b in &before {
                    resources.add_edge(b, a, kind).map_err(|_| {
                        GraphError::CycleDetected(format!(
                            "'{}' -> '{}' closes a cycle once expanded to resources",
                            self.path_or_id(a),
                            self.path_or_id(b)
                        ))
                    })?;
                    if kind == EdgeKind::Explicit {
                        explicit.entry(a).or_default().insert(b);
                    }
                }
            }
        }

        let order = resources.ordered_topological_sort(|n| self.path_of(n))?;
        let report = ValidationReport {
            node_count: self.tree.len(),
            resource_count: order.len(),
            declared_edge_count: self.declared.edge_count(),
            resource_edge_count: resources.edge_count(),
            fingerprint: self.fingerprint(),
        };

        tracing::debug!(
            resources = report.resource_count,
            edges = report.resource_edge_count,
            fingerprint = %report.fingerprint,
            "construct graph validated"
        );

        Ok(ValidatedGraph {
            order,
            explicit,
            resources,
            report,
        })
    }

    fn path_of(&self, node: NodeId) -> ConstructPath {
        self.tree.path(node).cloned().unwrap_or_default()
    }

    fn path_or_id(&self, node: NodeId) -> String {
        self.tree
            .path(node)
            .map_or_else(|_| node.to_string(), ToString::to_string)
    }

    /// SHA-256 over sorted paths, kinds and declared edges
    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        let mut nodes: Vec<(String, NodeKind)> = self
            .tree
            .iter()
            .map(|n| (n.path().to_string(), n.kind()))
            .collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));
        for (path, kind) in nodes {
            hasher.update(path.as_bytes());
            hasher.update([kind_tag(kind)]);
        }

        let mut edges: Vec<(String, String, EdgeKind)> = self
            .declared
            .edges()
            .map(|(a, b, k)| (self.path_or_id(a), self.path_or_id(b), k))
            .collect();
        edges.sort();
        for (from, to, kind) in edges {
            hasher.update(from.as_bytes());
            hasher.update([0]);
            hasher.update(to.as_bytes());
            hasher.update([match kind {
                EdgeKind::Explicit => 1,
                EdgeKind::Reference => 2,
            }]);
        }

        hex::encode(hasher.finalize())
    }
}

fn kind_tag(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Root => 0,
        NodeKind::Scope => 1,
        NodeKind::Resource => 2,
    }
}

/// Summary returned after successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub node_count: usize,
    pub resource_count: usize,
    pub declared_edge_count: usize,
    pub resource_edge_count: usize,
    /// Hex SHA-256 of the construct tree and declared edges
    pub fingerprint: String,
}

/// Resource graph that passed validation
///
/// Has no public constructor; obtained from [`GraphBuilder::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedGraph {
    order: Vec<NodeId>,
    explicit: BTreeMap<NodeId, BTreeSet<NodeId>>,
    resources: Dag,
    report: ValidationReport,
}

impl ValidatedGraph {
    /// Resources in an order that satisfies every edge
    #[inline]
    #[must_use]
    pub fn deployment_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Resources `resource` must wait for because of explicit edges
    #[must_use]
    pub fn explicit_dependencies(&self, resource: NodeId) -> BTreeSet<NodeId> {
        self.explicit.get(&resource).cloned().unwrap_or_default()
    }

    /// Every resource `resource` must wait for, explicit or by reference
    #[must_use]
    pub fn dependencies(&self, resource: NodeId) -> BTreeSet<NodeId> {
        self.resources.dependencies_of(resource)
    }

    #[inline]
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }
}
