//! `AWS::ServiceDiscovery::*`

use serde::Serialize;

use crate::expr::Expr;
use crate::resource::ResourceProperties;

/// `AWS::ServiceDiscovery::PrivateDnsNamespace`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrivateDnsNamespace {
    pub name: String,
    pub vpc: Expr,
}

impl PrivateDnsNamespace {
    #[must_use]
    pub fn new(name: impl Into<String>, vpc: Expr) -> Self {
        Self {
            name: name.into(),
            vpc,
        }
    }
}

impl ResourceProperties for PrivateDnsNamespace {
    const RESOURCE_TYPE: &'static str = "AWS::ServiceDiscovery::PrivateDnsNamespace";
}
