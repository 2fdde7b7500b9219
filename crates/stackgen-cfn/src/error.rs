//! Error types for the CloudFormation model

/// Errors raised while building or rendering template values
#[derive(Debug, thiserror::Error)]
pub enum CfnError {
    /// Properties could not be turned into JSON
    #[error("failed to serialize {resource_type} properties: {source}")]
    Properties {
        resource_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Template could not be rendered as JSON
    #[error("failed to render template as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Template could not be rendered as YAML
    #[error("failed to render template as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two resources share a logical ID
    #[error("duplicate logical id '{0}'")]
    DuplicateLogicalId(String),

    /// A referenced logical ID is not in the template
    #[error("logical id '{0}' not found")]
    UnknownLogicalId(String),

    /// A duration cannot be expressed in the unit a property requires
    #[error("duration {duration} cannot be converted into a whole number of {unit}")]
    FractionalDuration { duration: String, unit: &'static str },

    /// A duration is too long to express in seconds
    #[error("duration {0} overflows when converted to seconds")]
    DurationOverflow(String),
}
