//! `dwflatten resolve`: flatten a workspace file and print it.

use crate::config::Config;
use crate::fetch::ResolverTools;
use crate::models::{TemplateDocument, TemplateSpec, WorkspaceContribution};
use crate::resolver::{ResolvedWorkspace, check_plugins_compatibility, resolve};
use crate::variables::VariableWarnings;
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input options shared by every command that resolves a file.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// DevWorkspace, DevWorkspaceTemplate or devfile to flatten
    pub file: PathBuf,

    /// Namespace of the workspace [default: the document's namespace, then the configured one]
    #[arg(long)]
    pub namespace: Option<String>,

    /// Directory of DevWorkspaceTemplate files used for Kubernetes references
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,
}

impl ResolveArgs {
    /// Load the input file and resolve it with tools built from `config`.
    pub async fn resolve(&self, mut config: Config) -> Result<ResolvedWorkspace> {
        let input = WorkspaceInput::load(&self.file).await?;

        if let Some(namespace) = self.namespace.clone().or_else(|| input.namespace.clone()) {
            config.namespace = namespace;
        }
        if let Some(dir) = &self.templates_dir {
            config.templates_dir = Some(dir.clone());
        }
        let tools: ResolverTools = config.resolver_tools()?;
        debug!("Resolving {} with {:?}", self.file.display(), tools);

        resolve(&input.spec, &input.contributions, &tools)
            .await
            .with_context(|| format!("Failed to resolve {}", self.file.display()))
    }
}

/// A template spec read from disk, with the contributions and namespace of
/// the DevWorkspace it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceInput {
    pub spec: TemplateSpec,
    pub contributions: Vec<WorkspaceContribution>,
    pub namespace: Option<String>,
}

impl WorkspaceInput {
    pub async fn load(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read(path).await.with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_slice(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_slice(content: &[u8]) -> Result<Self> {
        Ok(match TemplateDocument::from_slice(content)? {
            TemplateDocument::DevWorkspace(workspace) => Self {
                spec: workspace.spec.template,
                contributions: workspace.spec.contributions,
                namespace: workspace.metadata.namespace,
            },
            TemplateDocument::DevWorkspaceTemplate(template) => Self {
                namespace: template.metadata.namespace.clone(),
                spec: template.spec,
                contributions: Vec::new(),
            },
            document @ TemplateDocument::Devfile(_) => Self {
                spec: document.into_fetched().spec,
                contributions: Vec::new(),
                namespace: None,
            },
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Render a flattened spec in `format`.
pub fn render(spec: &TemplateSpec, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(spec).context("Failed to serialize flattened spec as YAML"),
        OutputFormat::Json => serde_json::to_string_pretty(spec)
            .map(|json| json + "\n")
            .context("Failed to serialize flattened spec as JSON"),
    }
}

pub(crate) fn print_warnings(warnings: &VariableWarnings) {
    eprintln!("{} workspace references undefined variables", "Warning:".yellow().bold());
    for line in warnings.to_string().lines() {
        eprintln!("  {line}");
    }
}

/// Flatten a workspace and print the result on stdout.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    #[command(flatten)]
    pub args: ResolveArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Fail when the imported plugins disagree on the editor
    #[arg(long)]
    pub check_compatibility: bool,
}

impl ResolveCommand {
    pub async fn execute(self, config: Config) -> Result<()> {
        let resolved = self.args.resolve(config).await?;

        if self.check_compatibility {
            check_plugins_compatibility(&resolved.tree)?;
        }
        if let Some(warnings) = &resolved.warnings {
            print_warnings(warnings);
        }

        print!("{}", render(&resolved.spec, self.format)?);
        Ok(())
    }
}
