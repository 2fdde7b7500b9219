//! Construct tree
//!
//! Every construct in a stack is a node in one tree rooted at the stack.
//! Scopes group children; resource nodes map 1:1 onto template resources.

use std::fmt;

use crate::error::GraphError;
use crate::path::{ConstructPath, PATH_SEP};

/// Handle to a node of a [`ConstructTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Index of the node in allocation order
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The stack itself
    Root,
    /// Grouping construct without a template entry of its own
    Scope,
    /// Leaf that synthesizes to exactly one template resource
    Resource,
}

/// A node of the construct tree
#[derive(Debug, Clone)]
pub struct ConstructNode {
    id: NodeId,
    path: ConstructPath,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl ConstructNode {
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &ConstructPath {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// Arena of construct nodes
#[derive(Debug, Clone)]
pub struct ConstructTree {
    nodes: Vec<ConstructNode>,
}

impl ConstructTree {
    /// Create a tree whose root is the stack named `root_id`
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidId`] for an empty id or one containing `/`
    pub fn new(root_id: &str) -> Result<Self, GraphError> {
        validate_id(root_id)?;
        Ok(Self {
            nodes: vec![ConstructNode {
                id: NodeId(0),
                path: ConstructPath::single(root_id),
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Root,
            }],
        })
    }

    /// The stack node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes including the root
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a child under `parent`
    ///
    /// # Errors
    /// - [`GraphError::NodeNotFound`] if `parent` is unknown
    /// - [`GraphError::InvalidId`] for an empty id or one containing `/`
    /// - [`GraphError::DuplicateId`] if `parent` already has a child named `id`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        id: &str,
        kind: NodeKind,
    ) -> Result<NodeId, GraphError> {
        validate_id(id)?;
        let parent_node = self.node(parent)?;
        if parent_node.kind == NodeKind::Resource {
            return Err(GraphError::InvalidId(format!(
                "{id} (parent '{}' is a resource)",
                parent_node.path
            )));
        }
        if parent_node
            .children
            .iter()
            .any(|c| self.nodes[c.index()].path.last() == Some(id))
        {
            return Err(GraphError::DuplicateId {
                parent: parent_node.path.to_string(),
                id: id.to_string(),
            });
        }

        let path = parent_node.path.child(id);
        let next = u32::try_from(self.nodes.len())
            .map_err(|_| GraphError::InvalidId(format!("{id} (tree is full)")))?;
        let node_id = NodeId(next);

        tracing::trace!(path = %path, ?kind, "construct added");
        self.nodes.push(ConstructNode {
            id: node_id,
            path,
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.index()].children.push(node_id);
        Ok(node_id)
    }

    /// Look up a node
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for ids from another tree
    pub fn node(&self, id: NodeId) -> Result<&ConstructNode, GraphError> {
        self.nodes.get(id.index()).ok_or(GraphError::NodeNotFound(id))
    }

    /// Path of a node
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for ids from another tree
    pub fn path(&self, id: NodeId) -> Result<&ConstructPath, GraphError> {
        self.node(id).map(ConstructNode::path)
    }

    /// Find the node at `path`
    #[must_use]
    pub fn find(&self, path: &ConstructPath) -> Option<NodeId> {
        self.nodes.iter().find(|n| &n.path == path).map(|n| n.id)
    }

    /// Find a direct child of `parent` by id
    #[must_use]
    pub fn child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        let parent = self.nodes.get(parent.index())?;
        parent
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.index()].path.last() == Some(id))
    }

    /// `id` and everything below it, depth first in insertion order
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for ids from another tree
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children = &self.nodes[current.index()].children;
            stack.extend(children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Resource nodes at or below `id`
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for ids from another tree
    pub fn resources_under(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self
            .descendants(id)?
            .into_iter()
            .filter(|n| self.nodes[n.index()].kind == NodeKind::Resource)
            .collect())
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ConstructNode> {
        self.nodes.iter()
    }
}

fn validate_id(id: &str) -> Result<(), GraphError> {
    if id.is_empty() || id.contains(PATH_SEP) {
        return Err(GraphError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_builds_paths() {
        let mut tree = ConstructTree::new("EcsStack").unwrap();
        let net = tree
            .add_child(tree.root(), "NetworkConstruct", NodeKind::Scope)
            .unwrap();
        let vpc = tree.add_child(net, "Default", NodeKind::Resource).unwrap();

        assert_eq!(
            tree.path(vpc).unwrap().to_string(),
            "EcsStack/NetworkConstruct/Default"
        );
        assert_eq!(tree.node(vpc).unwrap().parent(), Some(net));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let mut tree = ConstructTree::new("S").unwrap();
        tree.add_child(tree.root(), "A", NodeKind::Scope).unwrap();
        let err = tree.add_child(tree.root(), "A", NodeKind::Scope).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateId { .. }));
    }

    #[test]
    fn same_id_under_different_parents_allowed() {
        let mut tree = ConstructTree::new("S").unwrap();
        let a = tree.add_child(tree.root(), "A", NodeKind::Scope).unwrap();
        let b = tree.add_child(tree.root(), "B", NodeKind::Scope).unwrap();
        assert!(tree.add_child(a, "Default", NodeKind::Resource).is_ok());
        assert!(tree.add_child(b, "Default", NodeKind::Resource).is_ok());
    }

    #[test]
    fn invalid_ids_rejected() {
        let mut tree = ConstructTree::new("S").unwrap();
        assert!(matches!(
            tree.add_child(tree.root(), "", NodeKind::Scope),
            Err(GraphError::InvalidId(_))
        ));
        assert!(matches!(
            tree.add_child(tree.root(), "a/b", NodeKind::Scope),
            Err(GraphError::InvalidId(_))
        ));
        assert!(ConstructTree::new("").is_err());
    }

    #[test]
    fn resource_cannot_have_children() {
        let mut tree = ConstructTree::new("S").unwrap();
        let r = tree.add_child(tree.root(), "R", NodeKind::Resource).unwrap();
        assert!(tree.add_child(r, "X", NodeKind::Resource).is_err());
    }

    #[test]
    fn resources_under_walks_depth_first() {
        let mut tree = ConstructTree::new("S").unwrap();
        let a = tree.add_child(tree.root(), "A", NodeKind::Scope).unwrap();
        let r1 = tree.add_child(a, "R1", NodeKind::Resource).unwrap();
        let inner = tree.add_child(a, "Inner", NodeKind::Scope).unwrap();
        let r2 = tree.add_child(inner, "R2", NodeKind::Resource).unwrap();
        let r3 = tree.add_child(a, "R3", NodeKind::Resource).unwrap();

        assert_eq!(tree.resources_under(a).unwrap(), vec![r1, r2, r3]);
        assert_eq!(tree.resources_under(r2).unwrap(), vec![r2]);
        assert_eq!(tree.child(a, "Inner"), Some(inner));
        assert_eq!(tree.find(tree.path(r3).unwrap()), Some(r3));
    }
}
