//! stackgen Core - ECS Fargate stack
//!
//! Assembles the deployable unit:
//! - A VPC with public subnets, an S3 gateway endpoint and S3 flow logs
//! - A Cloud Map private DNS namespace
//! - Two Fargate services registered through Service Connect
//! - Explicit ordering edges between them
//!
//! and synthesizes it into a CloudFormation template plus manifest.
//!
//! # Example
//!
//! ```rust,ignore
//! use stackgen_core::{EcsStack, EcsStackParams, OutputFormat, SynthesizedStack};
//!
//! let params = EcsStackParams::resolve(None)?;
//! let stack = EcsStack::build("EcsStack", &params)?;
//! let synthesized = SynthesizedStack::new(&stack, OutputFormat::Json)?;
//! synthesized.write_to(std::path::Path::new("cdk.out"))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod ecs_stack;
pub mod error;
pub mod synth;

pub use config::{ConfigFormat, EcsStackParams, EcsStackProps, Environment};
pub use ecs_stack::{EcsStack, DEFAULT_STACK_NAME};
pub use error::{Result, StackError};
pub use synth::{template_file_name, Manifest, OutputFormat, SynthesizedStack, MANIFEST_FILE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and synthesizing the stack
    pub use crate::{EcsStack, EcsStackParams, Environment, OutputFormat, SynthesizedStack};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
