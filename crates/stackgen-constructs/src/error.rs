//! Error types for constructs

use stackgen_cfn::CfnError;
use stackgen_graph::GraphError;

/// Errors raised while declaring constructs
#[derive(Debug, thiserror::Error)]
pub enum ConstructError {
    /// CIDR block could not be parsed or has host bits set
    #[error("invalid CIDR block '{0}'")]
    InvalidCidr(String),

    /// No room left in the VPC CIDR for another subnet
    #[error("CIDR block {cidr} has no room left for a /{mask} subnet")]
    CidrExhausted { cidr: String, mask: u8 },

    /// Subnet mask outside what the VPC and EC2 allow
    #[error("subnet mask /{mask} is invalid: {reason}")]
    InvalidMask { mask: u8, reason: String },

    /// Network spread over zero availability zones
    #[error("network must span at least one availability zone")]
    NoAvailabilityZones,

    /// NAT gateways requested with nowhere to place them
    #[error("{nat_gateways} NAT gateway(s) requested but no public subnet is configured")]
    NatWithoutPublicSubnet { nat_gateways: u32 },

    /// Subnet plan is inconsistent
    #[error("invalid subnet configuration: {0}")]
    InvalidSubnetConfiguration(String),

    /// Lifecycle rule values out of range
    #[error("invalid lifecycle rule '{rule}': {reason}")]
    InvalidLifecycleRule { rule: String, reason: String },

    /// Two lifecycle rules render to the same id
    #[error("duplicate lifecycle rule id '{0}'")]
    DuplicateLifecycleRuleId(String),

    /// `add_flow_log` called twice on one network
    #[error("flow log already attached to '{0}'")]
    FlowLogAlreadyAttached(String),

    /// Construct tree or dependency graph rejected the change
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// CloudFormation model rejected a value
    #[error("template error: {0}")]
    Cfn(#[from] CfnError),
}

/// Result alias for construct operations
pub type Result<T> = std::result::Result<T, ConstructError>;
