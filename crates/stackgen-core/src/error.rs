//! Error types for stack assembly and synthesis

use std::path::PathBuf;

use stackgen_cfn::CfnError;
use stackgen_constructs::ConstructError;

/// Main stack error type
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Configuration file could not be read
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("failed to parse {format} config {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    /// Extension does not map to a supported format
    #[error("unsupported config format for {0} (expected .yaml, .yml, .toml or .json)")]
    UnsupportedConfigFormat(PathBuf),

    /// A construct rejected its input or the graph rejected an edge
    #[error("construct failed: {0}")]
    Construct(#[from] ConstructError),

    /// Template rendering failed
    #[error("template rendering failed: {0}")]
    Template(#[from] CfnError),

    /// Manifest could not be serialized
    #[error("manifest rendering failed: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Output could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StackError {
    /// Whether the error came from user-supplied configuration
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigRead { .. } | Self::ConfigParse { .. } | Self::UnsupportedConfigFormat(_)
        )
    }
}

/// Result alias for stack operations
pub type Result<T> = std::result::Result<T, StackError>;
