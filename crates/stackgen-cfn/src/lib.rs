//! stackgen CloudFormation model
//!
//! Everything needed to describe a template without talking to AWS.
//!
//! # Core Concepts
//!
//! - [`Expr`]: Property value, either a literal or an intrinsic function
//! - [`ResourceProperties`]: Trait implemented by every typed property struct
//! - [`Resource`]: One template entry (type, properties, `DependsOn`, policies)
//! - [`Template`]: The document, resources kept in insertion order
//! - [`Duration`]: Time spans converted to the unit each property expects
//!
//! # Example
//!
//! ```rust,ignore
//! use stackgen_cfn::{types::ec2::Vpc, Expr, Resource, Template};
//!
//! let vpc = Vpc::new("10.10.0.0/20", vec![]);
//! let mut template = Template::new();
//! template.insert("Vpc", Resource::new(&vpc)?)?;
//! println!("{}", template.to_json_pretty()?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod duration;
mod error;
mod expr;
mod resource;
mod template;

pub mod types;

pub use duration::Duration;
pub use error::CfnError;
pub use expr::{references, Expr, PSEUDO_PREFIX};
pub use resource::{DeletionPolicy, Resource, ResourceProperties};
pub use template::{Template, TEMPLATE_FORMAT_VERSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
