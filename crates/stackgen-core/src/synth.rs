//! Cloud assembly output: template plus manifest

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stackgen_cfn::Template;

use crate::ecs_stack::EcsStack;
use crate::error::{Result, StackError};

pub const MANIFEST_FILE: &str = "manifest.json";
/// Bumped when the manifest layout changes
pub const MANIFEST_VERSION: &str = "1.0";

/// Template encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Describes what was synthesized and in which order it deploys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub stack_name: String,
    /// `aws://account/region`
    pub environment: String,
    pub template_file: String,
    pub resource_count: usize,
    /// Hex SHA-256 of the construct tree and declared edges
    pub fingerprint: String,
    pub deployment_order: Vec<String>,
    /// `DependsOn` of each resource that has one
    pub explicit_dependencies: BTreeMap<String, Vec<String>>,
}

/// A synthesized stack ready to be rendered or written
#[derive(Debug, Clone)]
pub struct SynthesizedStack {
    template: Template,
    manifest: Manifest,
    format: OutputFormat,
}

impl SynthesizedStack {
    /// Synthesize `stack`
    ///
    /// # Errors
    /// Graph and template errors from [`EcsStack::synth`]
    pub fn new(stack: &EcsStack, format: OutputFormat) -> Result<Self> {
        let synthesis = stack.synth()?;
        let template = synthesis.template;

        let explicit_dependencies = template
            .resources()
            .filter(|(_, r)| !r.depends_on().is_empty())
            .map(|(id, r)| (id.to_string(), r.depends_on().iter().cloned().collect()))
            .collect();

        let manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            stack_name: stack.name().to_string(),
            environment: stack.env().to_string(),
            template_file: template_file_name(stack.name(), format),
            resource_count: template.resource_count(),
            fingerprint: synthesis.graph.report().fingerprint.clone(),
            deployment_order: synthesis.deployment_order,
            explicit_dependencies,
        };

        tracing::info!(
            stack = %manifest.stack_name,
            resources = manifest.resource_count,
            fingerprint = %manifest.fingerprint,
            "stack synthesized"
        );

        Ok(Self {
            template,
            manifest,
            format,
        })
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Template in the chosen encoding
    ///
    /// # Errors
    /// Returns [`StackError::Template`] if serialization fails
    pub fn render_template(&self) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => self.template.to_json_pretty()?,
            OutputFormat::Yaml => self.template.to_yaml()?,
        })
    }

    /// # Errors
    /// Returns [`StackError::Manifest`] if serialization fails
    pub fn render_manifest(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.manifest)?)
    }

    /// Write the template and manifest into `dir`, creating it if needed
    ///
    /// Returns the written paths, template first.
    ///
    /// # Errors
    /// Returns [`StackError::Write`] on I/O failure
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir).map_err(|source| StackError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let template_path = dir.join(&self.manifest.template_file);
        write_file(&template_path, &self.render_template()?)?;
        let manifest_path = dir.join(MANIFEST_FILE);
        write_file(&manifest_path, &self.render_manifest()?)?;

        tracing::info!(dir = %dir.display(), "cloud assembly written");
        Ok(vec![template_path, manifest_path])
    }
}

/// `{stack}.template.{json|yaml}`
#[must_use]
pub fn template_file_name(stack_name: &str, format: OutputFormat) -> String {
    format!("{stack_name}.template.{}", format.extension())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut content = content.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|source| StackError::Write {
        path: path.to_path_buf(),
        source,
    })
}
