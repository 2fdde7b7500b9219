//! ECS stack assembly
//!
//! One network, one private DNS namespace and two Fargate services, with
//! the flow log attached last. Ordering between them is carried by explicit
//! construct edges:
//!
//! ```text
//! EcsFargateConstruct   -> PrivateDnsNamespace
//! EcsFargateConstruct2  -> PrivateDnsNamespace, EcsFargateConstruct
//! FlowLogsToS3          -> EcsFargateConstruct2
//! ```

use stackgen_constructs::{
    EcsFargateConstruct, EcsFargateProps, NetworkConstruct, PrivateDnsNamespace, Stack,
    StackSynthesis,
};

use crate::config::{EcsStackParams, Environment};
use crate::error::Result;

pub const DEFAULT_STACK_NAME: &str = "EcsStack";
pub const STACK_DESCRIPTION: &str =
    "VPC with S3 flow logs, Cloud Map namespace and two Fargate services behind Service Connect";

pub const NETWORK_ID: &str = "NetworkConstruct";
pub const NAMESPACE_ID: &str = "PrivateDnsNamespace";
pub const NAMESPACE_NAME: &str = "local";
pub const SERVICE_ID: &str = "EcsFargateConstruct";
pub const SERVICE_DISCOVERY_NAME: &str = "ecs-fargate";
pub const SECOND_SERVICE_ID: &str = "EcsFargateConstruct2";
pub const SECOND_SERVICE_DISCOVERY_NAME: &str = "ecs-fargate2";

/// Assembled stack and handles to its constructs
#[derive(Debug)]
pub struct EcsStack {
    stack: Stack,
    env: Environment,
    network: NetworkConstruct,
    namespace: PrivateDnsNamespace,
    services: [EcsFargateConstruct; 2],
}

impl EcsStack {
    /// Declare every construct and wire the ordering edges
    ///
    /// # Errors
    /// Returns [`StackError::Construct`](crate::StackError::Construct) when
    /// the network plan is invalid or an edge would close a cycle
    pub fn build(name: &str, params: &EcsStackParams) -> Result<Self> {
        let mut stack = Stack::new(name)?.with_description(STACK_DESCRIPTION);
        let root = stack.root();

        let mut network = NetworkConstruct::new(&mut stack, root, NETWORK_ID, &params.props.network)?;
        let namespace = PrivateDnsNamespace::new(&mut stack, root, NAMESPACE_ID, NAMESPACE_NAME, &network)?;

        let first = EcsFargateConstruct::new(
            &mut stack,
            root,
            SERVICE_ID,
            &EcsFargateProps {
                network: &network,
                namespace: &namespace,
                discovery_name: SERVICE_DISCOVERY_NAME,
            },
        )?;
        stack.add_dependency(first.node(), namespace.node())?;

        let second = EcsFargateConstruct::new(
            &mut stack,
            root,
            SECOND_SERVICE_ID,
            &EcsFargateProps {
                network: &network,
                namespace: &namespace,
                discovery_name: SECOND_SERVICE_DISCOVERY_NAME,
            },
        )?;
        stack.add_dependency(second.node(), namespace.node())?;
        stack.add_dependency(second.node(), first.node())?;

        // the second service already waits for the first
        network.add_flow_log(&mut stack, Some(second.node()))?;

        tracing::info!(
            stack = name,
            env = %params.env,
            resources = stack.resource_count(),
            "ecs stack assembled"
        );

        Ok(Self {
            stack,
            env: params.env.clone(),
            network,
            namespace,
            services: [first, second],
        })
    }

    /// Build with the built-in parameters
    ///
    /// # Errors
    /// See [`EcsStack::build`]
    pub fn with_defaults(name: &str) -> Result<Self> {
        Self::build(name, &EcsStackParams::default())
    }

    /// Validate the graph and render the template
    ///
    /// # Errors
    /// Graph and template errors from [`Stack::synth`]
    pub fn synth(&self) -> Result<StackSynthesis> {
        Ok(self.stack.synth()?)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.stack.name()
    }

    #[inline]
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    #[inline]
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    #[inline]
    #[must_use]
    pub fn network(&self) -> &NetworkConstruct {
        &self.network
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &PrivateDnsNamespace {
        &self.namespace
    }

    #[inline]
    #[must_use]
    pub fn services(&self) -> &[EcsFargateConstruct; 2] {
        &self.services
    }
}
