//! Directory-backed [`TemplateGetter`].
//!
//! Outside a cluster, DevWorkspaceTemplates can be kept as YAML or JSON files
//! in a directory tree. Every file whose document is a DevWorkspaceTemplate is
//! indexed by `metadata.namespace` / `metadata.name`; templates without a
//! namespace belong to the store's default namespace. Files of any other kind,
//! or that are not YAML at all, are skipped. A file claiming
//! `kind: DevWorkspaceTemplate` that does not decode fails the lookup.
//!
//! The directory is re-read on every lookup. `walkdir` is synchronous, so the
//! walk runs inside `spawn_blocking`.

use super::TemplateGetter;
use crate::constants::DEVWORKSPACE_TEMPLATE_KIND;
use crate::models::DevWorkspaceTemplate;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Template store reading DevWorkspaceTemplate files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
    default_namespace: String,
}

impl DirectoryTemplateStore {
    pub fn new(root: impl Into<PathBuf>, default_namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_namespace: default_namespace.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every DevWorkspaceTemplate under the store root, with namespaces filled in.
    pub fn load_templates(&self) -> Result<Vec<DevWorkspaceTemplate>> {
        if !self.root.is_dir() {
            anyhow::bail!("Template directory {} does not exist", self.root.display());
        }

        let mut templates = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read {}", self.root.display()))?;
            let path = entry.path();
            let is_template_file = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()).is_some_and(|e| matches!(e, "yaml" | "yml" | "json"));
            if !is_template_file {
                continue;
            }

            let content = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            let Ok(raw) = serde_yaml::from_slice::<serde_yaml::Value>(&content) else {
                debug!("Skipping {}: not YAML or JSON", path.display());
                continue;
            };
            if raw.get("kind").and_then(serde_yaml::Value::as_str) != Some(DEVWORKSPACE_TEMPLATE_KIND) {
                debug!("Skipping {}: not a DevWorkspaceTemplate", path.display());
                continue;
            }
            let mut template: DevWorkspaceTemplate =
                serde_yaml::from_value(raw).with_context(|| format!("Failed to parse {}", path.display()))?;

            if template.metadata.namespace.is_none() {
                template.metadata.namespace = Some(self.default_namespace.clone());
            }
            templates.push(template);
        }
        Ok(templates)
    }
}

#[async_trait]
impl TemplateGetter for DirectoryTemplateStore {
    async fn get_template(&self, name: &str, namespace: &str) -> Result<Option<DevWorkspaceTemplate>> {
        let store = self.clone();
        let templates = tokio::task::spawn_blocking(move || store.load_templates())
            .await
            .context("Template store task failed")??;

        Ok(templates
            .into_iter()
            .find(|t| t.metadata.name.as_deref() == Some(name) && t.metadata.namespace.as_deref() == Some(namespace)))
    }
}
