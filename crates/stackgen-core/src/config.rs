//! Stack parameters
//!
//! Built-in defaults describe the reference deployment. A YAML, TOML or
//! JSON file may override any part of it; account and region also come
//! from `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stackgen_constructs::NetworkProps;

use crate::error::{Result, StackError};

/// Account used when none is configured
pub const UNKNOWN_ACCOUNT: &str = "unknown-account";
/// Region used when none is configured
pub const UNKNOWN_REGION: &str = "unknown-region";

pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

/// Target account and region, both optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Environment {
    /// Read `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Environment::from_env`] with an injectable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            account: non_empty(ACCOUNT_ENV),
            region: non_empty(REGION_ENV),
        }
    }

    /// Fill unset fields from `other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            account: self.account.or(other.account),
            region: self.region.or(other.region),
        }
    }

    #[must_use]
    pub fn account_or_unknown(&self) -> &str {
        self.account.as_deref().unwrap_or(UNKNOWN_ACCOUNT)
    }

    #[must_use]
    pub fn region_or_unknown(&self) -> &str {
        self.region.as_deref().unwrap_or(UNKNOWN_REGION)
    }
}

impl fmt::Display for Environment {
    /// `aws://account/region`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws://{}/{}", self.account_or_unknown(), self.region_or_unknown())
    }
}

/// Properties of the ECS stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsStackProps {
    pub network: NetworkProps,
}

/// Everything needed to build the stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsStackParams {
    pub env: Environment,
    pub props: EcsStackProps,
}

/// Configuration file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

impl EcsStackParams {
    /// Built-in parameters
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_network(mut self, network: NetworkProps) -> Self {
        self.props.network = network;
        self
    }

    /// Parse parameters from `content`
    ///
    /// # Errors
    /// Returns [`StackError::ConfigParse`] on malformed input or unknown keys
    pub fn parse(content: &str, format: ConfigFormat, origin: &Path) -> Result<Self> {
        let parsed = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| StackError::ConfigParse {
            path: origin.to_path_buf(),
            format: format.name(),
            message,
        })
    }

    /// Load parameters from a file
    ///
    /// # Errors
    /// - [`StackError::UnsupportedConfigFormat`] for an unknown extension
    /// - [`StackError::ConfigRead`] if the file cannot be read
    /// - [`StackError::ConfigParse`] if it does not parse
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StackError::UnsupportedConfigFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| StackError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let params = Self::parse(&content, format, path)?;
        tracing::info!(path = %path.display(), format = format.name(), "configuration loaded");
        Ok(params)
    }

    /// Built-in parameters, or a file when given, with the environment
    /// filling whatever account/region the parameters leave unset
    ///
    /// # Errors
    /// See [`EcsStackParams::load`]
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let params = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let env = params.env.clone().or(Environment::from_env());
        Ok(params.with_env(env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackgen_constructs::{FlowLogTrafficType, SubnetType};

    #[test]
    fn defaults_match_reference_deployment() {
        let params = EcsStackParams::new();
        let network = &params.props.network;
        assert_eq!(network.vpc_cidr, "10.10.0.0/20");
        assert_eq!(network.max_azs, 2);
        assert_eq!(network.nat_gateways, 0);
        assert_eq!(network.subnet_configurations.len(), 1);
        assert_eq!(network.subnet_configurations[0].subnet_type, SubnetType::Public);
        assert_eq!(network.subnet_configurations[0].cidr_mask, 27);
        assert_eq!(network.vpc_flow_logs.traffic_type, FlowLogTrafficType::All);
        assert_eq!(network.vpc_flow_logs.lifecycle_rules[0].expiration_days, 365);
    }

    #[test]
    fn environment_display_falls_back() {
        assert_eq!(
            Environment::default().to_string(),
            "aws://unknown-account/unknown-region"
        );
        let env = Environment {
            account: Some("123456789012".into()),
            region: Some("ap-northeast-1".into()),
        };
        assert_eq!(env.to_string(), "aws://123456789012/ap-northeast-1");
    }

    #[test]
    fn environment_from_lookup_ignores_blank() {
        let env = Environment::from_lookup(|key| match key {
            ACCOUNT_ENV => Some("111111111111".into()),
            REGION_ENV => Some("  ".into()),
            _ => None,
        });
        assert_eq!(env.account.as_deref(), Some("111111111111"));
        assert_eq!(env.region, None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "props:\n  network:\n    max_azs: 3\n";
        let params = EcsStackParams::parse(yaml, ConfigFormat::Yaml, Path::new("p.yaml")).unwrap();
        assert_eq!(params.props.network.max_azs, 3);
        assert_eq!(params.props.network.vpc_cidr, "10.10.0.0/20");
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = EcsStackParams::parse("{\"props\": {\"nope\": 1}}", ConfigFormat::Json, Path::new("p.json"))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.YML")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_path(Path::new("a.ini")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), None);
    }
}
