//! The stack scope
//!
//! A [`Stack`] owns the construct tree, the declared dependency graph and
//! the CloudFormation resource behind every resource node. Constructs add
//! to it; [`Stack::synth`] validates the graph and renders a [`Template`].

use std::collections::HashMap;

use indexmap::IndexMap;
use stackgen_cfn::{CfnError, DeletionPolicy, Expr, Resource, ResourceProperties, Template};
use stackgen_graph::{
    logical_id, ConstructPath, EdgeKind, GraphBuilder, GraphError, NodeId, NodeKind,
    ValidatedGraph,
};

use crate::error::Result;

/// Handle to a resource added to a [`Stack`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    node: NodeId,
    logical_id: String,
}

impl ResourceRef {
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// `{ "Ref": logical_id }`
    #[inline]
    #[must_use]
    pub fn to_ref(&self) -> Expr {
        Expr::reference(&self.logical_id)
    }

    /// `{ "Fn::GetAtt": [logical_id, attribute] }`
    #[inline]
    #[must_use]
    pub fn get_att(&self, attribute: &str) -> Expr {
        Expr::get_att(&self.logical_id, attribute)
    }
}

/// A stack under construction
#[derive(Debug)]
pub struct Stack {
    name: String,
    description: Option<String>,
    graph: GraphBuilder,
    resources: IndexMap<NodeId, Resource>,
    logical_ids: HashMap<NodeId, String>,
    nodes_by_logical_id: HashMap<String, NodeId>,
}

/// Result of [`Stack::synth`]
#[derive(Debug, Clone)]
pub struct StackSynthesis {
    pub template: Template,
    pub graph: ValidatedGraph,
    /// Logical IDs in deployment order
    pub deployment_order: Vec<String>,
}

impl Stack {
    /// # Errors
    /// Returns [`GraphError::InvalidId`](stackgen_graph::GraphError) for an unusable name
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            description: None,
            graph: GraphBuilder::new(name)?,
            resources: IndexMap::new(),
            logical_ids: HashMap::new(),
            nodes_by_logical_id: HashMap::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.graph.tree().root()
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &GraphBuilder {
        &self.graph
    }

    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for an unknown node
    pub fn path(&self, node: NodeId) -> Result<&ConstructPath> {
        Ok(self.graph.tree().path(node)?)
    }

    /// Add a grouping construct
    ///
    /// # Errors
    /// See [`stackgen_graph::ConstructTree::add_child`]
    pub fn add_scope(&mut self, parent: NodeId, id: &str) -> Result<NodeId> {
        Ok(self.graph.add_node(parent, id, NodeKind::Scope)?)
    }

    /// Logical ID a resource would get at `parent/id`
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] for an unknown parent
    pub fn logical_id_for(&self, parent: NodeId, id: &str) -> Result<String> {
        let path = self.path(parent)?.child(id);
        logical_id(path.below_root())
            .ok_or_else(|| GraphError::InvalidId(path.to_string()).into())
    }

    /// Add a resource node carrying `properties`
    ///
    /// Every logical ID the properties reference becomes a reference edge.
    ///
    /// # Errors
    /// - [`GraphError`] variants from the tree (duplicate id, invalid id)
    /// - [`CfnError::DuplicateLogicalId`] if two paths collapse to one id
    /// - [`CfnError::UnknownLogicalId`] if a reference points nowhere
    pub fn add_resource<P: ResourceProperties>(
        &mut self,
        parent: NodeId,
        id: &str,
        properties: &P,
    ) -> Result<ResourceRef> {
        let logical = self.logical_id_for(parent, id)?;
        if self.nodes_by_logical_id.contains_key(&logical) {
            return Err(CfnError::DuplicateLogicalId(logical).into());
        }
        let resource = Resource::new(properties)?;
        self.check_references(&logical, &resource)?;

        let node = self.graph.add_node(parent, id, NodeKind::Resource)?;
        self.logical_ids.insert(node, logical.clone());
        self.nodes_by_logical_id.insert(logical.clone(), node);
        self.link_references(node, &resource)?;
        self.resources.insert(node, resource);

        tracing::debug!(
            logical_id = %logical,
            resource_type = P::RESOURCE_TYPE,
            path = %self.path(node)?,
            "resource added"
        );
        Ok(ResourceRef {
            node,
            logical_id: logical,
        })
    }

    /// Re-render the properties of an existing resource
    ///
    /// # Errors
    /// - [`GraphError::NodeNotFound`] if `node` holds no resource
    /// - [`CfnError`] on serialization failure or unknown references
    pub fn update_resource<P: ResourceProperties>(
        &mut self,
        node: NodeId,
        properties: &P,
    ) -> Result<()> {
        let mut resource = self
            .resources
            .get(&node)
            .cloned()
            .ok_or(GraphError::NodeNotFound(node))?;
        resource.set_properties(properties)?;
        if let Some(logical) = self.logical_id(node) {
            self.check_references(logical, &resource)?;
        }
        self.link_references(node, &resource)?;
        self.resources.insert(node, resource);
        Ok(())
    }

    /// Set `UpdateReplacePolicy` and `DeletionPolicy` of a resource
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`] if `node` holds no resource
    pub fn set_deletion_policy(&mut self, node: NodeId, policy: DeletionPolicy) -> Result<()> {
        self.resources
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?
            .set_deletion_policy(policy);
        Ok(())
    }

    /// Declare that `dependent` deploys after `dependency`
    ///
    /// Both may be scopes; the edge is expanded to every resource pair
    /// underneath at synthesis.
    ///
    /// # Errors
    /// See [`GraphBuilder::add_dependency`]
    pub fn add_dependency(&mut self, dependent: NodeId, dependency: NodeId) -> Result<()> {
        Ok(self
            .graph
            .add_dependency(dependent, dependency, EdgeKind::Explicit)?)
    }

    #[inline]
    #[must_use]
    pub fn resource(&self, node: NodeId) -> Option<&Resource> {
        self.resources.get(&node)
    }

    #[inline]
    #[must_use]
    pub fn logical_id(&self, node: NodeId) -> Option<&str> {
        self.logical_ids.get(&node).map(String::as_str)
    }

    /// Logical IDs of the resources at or below `scope`, in declaration order
    ///
    /// # Errors
    /// Returns [`GraphError::NodeNotFound`](stackgen_graph::GraphError) for a foreign node
    pub fn logical_ids_under(&self, scope: NodeId) -> Result<Vec<String>> {
        Ok(self
            .graph
            .tree()
            .resources_under(scope)?
            .into_iter()
            .filter_map(|n| self.logical_id(n).map(ToString::to_string))
            .collect())
    }

    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn check_references(&self, logical: &str, resource: &Resource) -> Result<()> {
        match resource
            .references()
            .into_iter()
            .find(|t| t != logical && !self.nodes_by_logical_id.contains_key(t))
        {
            Some(unknown) => Err(CfnError::UnknownLogicalId(unknown).into()),
            None => Ok(()),
        }
    }

    fn link_references(&mut self, node: NodeId, resource: &Resource) -> Result<()> {
        for target in resource.references() {
            let dependency = *self
                .nodes_by_logical_id
                .get(&target)
                .ok_or_else(|| CfnError::UnknownLogicalId(target.clone()))?;
            if dependency != node {
                self.graph
                    .add_dependency(node, dependency, EdgeKind::Reference)?;
            }
        }
        Ok(())
    }

    /// Validate the dependency graph and render the template
    ///
    /// Explicit edges become `DependsOn`; reference edges are left to the
    /// intrinsic functions that created them.
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if the resource graph has a cycle
    pub fn synth(&self) -> Result<StackSynthesis> {
        let graph = self.graph.validate()?;

        let mut template = Template::new();
        if let Some(description) = &self.description {
            template = template.with_description(description.clone());
        }

        for (node, resource) in &self.resources {
            let Some(logical) = self.logical_id(*node) else {
                continue;
            };
            let mut resource = resource.clone();
            for dependency in graph.explicit_dependencies(*node) {
                if let Some(id) = self.logical_id(dependency) {
                    resource.add_depends_on(id);
                }
            }
            template.insert(logical, resource)?;
        }

        let deployment_order = graph
            .deployment_order()
            .iter()
            .filter_map(|n| self.logical_id(*n).map(ToString::to_string))
            .collect();

        tracing::debug!(
            stack = %self.name,
            resources = template.resource_count(),
            "stack synthesized"
        );
        Ok(StackSynthesis {
            template,
            graph,
            deployment_order,
        })
    }
}
