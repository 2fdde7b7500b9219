//! Template document

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CfnError;
use crate::resource::Resource;

/// Value of `AWSTemplateFormatVersion`
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A CloudFormation template
///
/// Resources keep insertion order so a synthesized template reads in the
/// order constructs were declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: &'static str,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "Resources")]
    resources: IndexMap<String, Resource>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION,
            description: None,
            resources: IndexMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a resource
    ///
    /// # Errors
    /// Returns [`CfnError::DuplicateLogicalId`] if the id is taken
    pub fn insert(&mut self, logical_id: impl Into<String>, resource: Resource) -> Result<(), CfnError> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(CfnError::DuplicateLogicalId(logical_id));
        }
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources in insertion order
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resources of one type, in insertion order
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Resource)> + 'a {
        self.resources()
            .filter(move |(_, r)| r.resource_type() == resource_type)
    }

    #[inline]
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Render as pretty-printed JSON
    ///
    /// # Errors
    /// Returns [`CfnError::Json`] on serialization failure
    pub fn to_json_pretty(&self) -> Result<String, CfnError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as YAML
    ///
    /// # Errors
    /// Returns [`CfnError::Yaml`] on serialization failure
    pub fn to_yaml(&self) -> Result<String, CfnError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::types::servicediscovery::PrivateDnsNamespace;

    fn namespace() -> Resource {
        Resource::new(&PrivateDnsNamespace::new("local", Expr::reference("Vpc"))).unwrap()
    }

    #[test]
    fn duplicate_logical_id_rejected() {
        let mut t = Template::new();
        t.insert("Ns", namespace()).unwrap();
        assert!(matches!(
            t.insert("Ns", namespace()),
            Err(CfnError::DuplicateLogicalId(_))
        ));
    }

    #[test]
    fn json_keeps_insertion_order() {
        let mut t = Template::new().with_description("test");
        t.insert("Zeta", namespace()).unwrap();
        t.insert("Alpha", namespace()).unwrap();

        let json = t.to_json_pretty().unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
        assert!(json.starts_with("{\n  \"AWSTemplateFormatVersion\": \"2010-09-09\""));
    }

    #[test]
    fn yaml_render() {
        let mut t = Template::new();
        t.insert("Ns", namespace()).unwrap();
        let yaml = t.to_yaml().unwrap();
        assert!(yaml.contains("AWS::ServiceDiscovery::PrivateDnsNamespace"));
        assert!(yaml.contains("Ref: Vpc"));
    }
}
