//! Cloud Map private DNS namespace

use stackgen_cfn::types::servicediscovery::PrivateDnsNamespace as CfnPrivateDnsNamespace;
use stackgen_graph::NodeId;

use crate::error::Result;
use crate::network::NetworkConstruct;
use crate::stack::{ResourceRef, Stack};

/// A DNS namespace resolvable only from inside the network's VPC
#[derive(Debug, Clone)]
pub struct PrivateDnsNamespace {
    node: NodeId,
    namespace: ResourceRef,
    name: String,
}

impl PrivateDnsNamespace {
    /// # Errors
    /// Graph and template errors from [`Stack`]
    pub fn new(
        stack: &mut Stack,
        scope: NodeId,
        id: &str,
        name: &str,
        network: &NetworkConstruct,
    ) -> Result<Self> {
        let node = stack.add_scope(scope, id)?;
        let namespace = stack.add_resource(
            node,
            "Resource",
            &CfnPrivateDnsNamespace::new(name, network.vpc().to_ref()),
        )?;
        tracing::debug!(namespace = name, "private DNS namespace declared");
        Ok(Self {
            node,
            namespace,
            name: name.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &ResourceRef {
        &self.namespace
    }

    #[inline]
    #[must_use]
    pub fn namespace_name(&self) -> &str {
        &self.name
    }
}
