//! Typed resource properties, one module per AWS service
//!
//! Only the properties this workspace emits are modelled. Each struct
//! implements [`crate::ResourceProperties`].

pub mod ec2;
pub mod ecs;
pub mod iam;
pub mod s3;
pub mod servicediscovery;

use serde::{Deserialize, Serialize};

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The conventional `Name` tag
    #[inline]
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new("Name", value)
    }
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
