//! Error types for the construct graph

use crate::tree::NodeId;

/// Errors raised while building or validating the construct graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Construct id is empty or contains the path separator
    #[error("invalid construct id '{0}': must be non-empty and must not contain '/'")]
    InvalidId(String),

    /// A sibling with the same id already exists
    #[error("there is already a construct with id '{id}' in '{parent}'")]
    DuplicateId { parent: String, id: String },

    /// Node is not part of the tree or graph
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// Node cannot depend on itself
    #[error("node {0} cannot depend on itself")]
    SelfLoop(NodeId),

    /// A construct cannot depend on its own ancestor or descendant
    #[error("'{dependent}' and '{dependency}' are nested; dependencies must be between disjoint constructs")]
    NestedDependency { dependent: String, dependency: String },

    /// Adding the edge (or expanding the graph) would close a cycle
    #[error("dependency cycle: {0}")]
    CycleDetected(String),
}
