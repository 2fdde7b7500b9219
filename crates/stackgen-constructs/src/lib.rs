//! stackgen Constructs
//!
//! Building blocks that declare AWS resources into a [`Stack`].
//!
//! # Core Concepts
//!
//! - [`Stack`]: Owns the construct tree, dependency graph and resources
//! - [`NetworkConstruct`]: VPC, public/private subnets, gateways, S3 endpoint, flow logs
//! - [`LogBucketConstruct`]: Encrypted, private, TLS-only log bucket with expiry rules
//! - [`PrivateDnsNamespace`]: Cloud Map namespace scoped to the VPC
//! - [`EcsFargateConstruct`]: Cluster, nginx + busybox task and Fargate service
//!
//! # Example
//!
//! ```rust,ignore
//! use stackgen_constructs::{NetworkConstruct, NetworkProps, Stack};
//!
//! let mut stack = Stack::new("EcsStack")?;
//! let root = stack.root();
//! let mut network = NetworkConstruct::new(&mut stack, root, "NetworkConstruct", &NetworkProps::default())?;
//! network.add_flow_log(&mut stack, None)?;
//! let synthesis = stack.synth()?;
//! println!("{}", synthesis.template.to_json_pretty()?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cidr;
mod error;
pub mod fargate;
mod log_bucket;
mod log_format;
mod namespace;
mod network;
mod stack;

pub use error::{ConstructError, Result};
pub use fargate::{EcsFargateConstruct, EcsFargateProps};
pub use log_bucket::{rule_id, LifecycleRule, LogBucketConstruct, LogBucketProps};
pub use log_format::{render_log_format, LogField};
pub use namespace::PrivateDnsNamespace;
pub use network::{
    FlowLogFileFormat, FlowLogHandle, FlowLogProps, FlowLogTrafficType, NetworkConstruct,
    NetworkProps, S3DestinationOptions, SubnetConfiguration, SubnetHandle, SubnetType,
    FLOW_LOG_AGGREGATION_INTERVAL,
};
pub use stack::{ResourceRef, Stack, StackSynthesis};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
