//! stackgen Graph
//!
//! The construct model underneath stack synthesis.
//!
//! # Core Concepts
//!
//! - [`ConstructPath`]: Hierarchical address of a construct (`EcsStack/NetworkConstruct/Default`)
//! - [`ConstructTree`]: Owner of every construct node, enforcing unique sibling ids
//! - [`logical_id`]: Deterministic CloudFormation logical ID for a path
//! - [`Dag`]: Acyclic ordering graph over construct nodes
//! - [`GraphBuilder`]: Tree + declared edges, validated into a [`ValidatedGraph`]
//!
//! # Example
//!
//! ```rust,ignore
//! use stackgen_graph::{EdgeKind, GraphBuilder, NodeKind};
//!
//! let mut builder = GraphBuilder::new("EcsStack");
//! let root = builder.tree().root();
//! let ns = builder.add_node(root, "PrivateDnsNamespace", NodeKind::Resource)?;
//! let svc = builder.add_node(root, "EcsFargateConstruct", NodeKind::Scope)?;
//! builder.add_dependency(svc, ns, EdgeKind::Explicit)?;
//!
//! let validated = builder.validate()?;
//! println!("fingerprint: {}", validated.report().fingerprint);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod construction;
mod dag;
mod error;
mod logical_id;
mod path;
mod tree;

pub use construction::{GraphBuilder, ValidatedGraph, ValidationReport};
pub use dag::{Dag, EdgeKind};
pub use error::GraphError;
pub use logical_id::{logical_id, HASH_LEN, HIDDEN_FROM_HUMAN_ID, HIDDEN_ID, MAX_HUMAN_LEN};
pub use path::{ConstructPath, PATH_SEP};
pub use tree::{ConstructNode, ConstructTree, NodeId, NodeKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
