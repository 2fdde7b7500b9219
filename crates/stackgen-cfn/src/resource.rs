//! Template resources

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::CfnError;

/// Typed properties of one CloudFormation resource type
///
/// Implemented by every struct in [`crate::types`]; the struct's serde
/// form is the `Properties` block verbatim.
pub trait ResourceProperties: Serialize {
    /// e.g. `AWS::EC2::VPC`
    const RESOURCE_TYPE: &'static str;
}

/// What CloudFormation does with the physical resource on delete/replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// One entry of the `Resources` section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    resource_type: String,
    properties: Value,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    depends_on: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_replace_policy: Option<DeletionPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    /// Build a resource from typed properties
    ///
    /// # Errors
    /// Returns [`CfnError::Properties`] if the properties fail to serialize
    pub fn new<P: ResourceProperties>(properties: &P) -> Result<Self, CfnError> {
        let properties = serde_json::to_value(properties).map_err(|source| CfnError::Properties {
            resource_type: P::RESOURCE_TYPE,
            source,
        })?;
        Ok(Self {
            resource_type: P::RESOURCE_TYPE.to_string(),
            properties,
            depends_on: BTreeSet::new(),
            update_replace_policy: None,
            deletion_policy: None,
        })
    }

    pub fn set_deletion_policy(&mut self, policy: DeletionPolicy) {
        self.update_replace_policy = Some(policy);
        self.deletion_policy = Some(policy);
    }

    #[inline]
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    /// Replace the properties block
    ///
    /// Constructs that accumulate state after creation (bucket policy
    /// statements, lifecycle rules) re-render through this.
    ///
    /// # Errors
    /// Returns [`CfnError::Properties`] if the properties fail to serialize
    pub fn set_properties<P: ResourceProperties>(&mut self, properties: &P) -> Result<(), CfnError> {
        self.properties = serde_json::to_value(properties).map_err(|source| CfnError::Properties {
            resource_type: P::RESOURCE_TYPE,
            source,
        })?;
        Ok(())
    }

    /// Property by top-level key
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    #[inline]
    #[must_use]
    pub fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    pub fn add_depends_on(&mut self, logical_id: impl Into<String>) {
        self.depends_on.insert(logical_id.into());
    }

    #[inline]
    #[must_use]
    pub fn deletion_policy(&self) -> Option<DeletionPolicy> {
        self.deletion_policy
    }

    /// Logical IDs referenced from the properties block
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        crate::expr::references(&self.properties)
    }
}
