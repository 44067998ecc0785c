//! Top-level documents that carry a [`TemplateSpec`] and shape detection over them.
//!
//! The resolver never cares which document a template came from, only about
//! its spec and the labels used for editor compatibility. [`TemplateDocument`]
//! recognizes the three accepted shapes:
//!
//! 1. a devfile, when `schemaVersion` matches `^2\..+`
//! 2. an object with `kind: DevWorkspace` (the spec is `.spec.template`)
//! 3. an object with `kind: DevWorkspaceTemplate` (the spec is `.spec`)
//!
//! and [`TemplateDocument::into_fetched`] reduces any of them to a
//! [`FetchedTemplate`].

use super::attributes::Attributes;
use super::template::{TemplateSpec, WorkspaceContribution};
use crate::constants::{
    DEVWORKSPACE_API_VERSION, DEVWORKSPACE_KIND, DEVWORKSPACE_TEMPLATE_KIND,
    EDITOR_COMPATIBILITY_LABEL, EDITOR_NAME_LABEL,
};
use crate::core::{FlattenError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

static DEVFILE_SCHEMA_VERSION: OnceLock<Regex> = OnceLock::new();

fn devfile_schema_version() -> &'static Regex {
    DEVFILE_SCHEMA_VERSION.get_or_init(|| Regex::new(r"^2\..+").expect("schemaVersion pattern is valid"))
}

/// The subset of Kubernetes object metadata the resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevWorkspace {
    #[serde(default)]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: DevWorkspaceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevWorkspaceSpec {
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub template: TemplateSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<WorkspaceContribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevWorkspaceTemplate {
    #[serde(default)]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TemplateSpec,
}

impl DevWorkspaceTemplate {
    /// Build a template object around `spec`.
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: TemplateSpec) -> Self {
        Self {
            api_version: DEVWORKSPACE_API_VERSION.to_string(),
            kind: DEVWORKSPACE_TEMPLATE_KIND.to_string(),
            metadata,
            spec,
        }
    }
}

/// A devfile 2.x document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devfile {
    pub schema_version: String,
    #[serde(default)]
    pub metadata: DevfileMetadata,
    #[serde(flatten)]
    pub template: TemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevfileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Devfile {
    /// Labels a devfile exposes for editor compatibility.
    ///
    /// Devfiles have no labels, so the editor keys are read from string
    /// values in `metadata.attributes`.
    fn compatibility_labels(&self) -> BTreeMap<String, String> {
        [EDITOR_NAME_LABEL, EDITOR_COMPATIBILITY_LABEL]
            .into_iter()
            .filter_map(|key| match self.metadata.attributes.get(key) {
                Some(Value::String(v)) => Some((key.to_string(), v.clone())),
                _ => None,
            })
            .collect()
    }
}

/// A template as returned by a fetcher: its spec plus the labels of the
/// document it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedTemplate {
    /// Name of the source document, when it has one
    pub name: Option<String>,
    pub spec: TemplateSpec,
    pub labels: BTreeMap<String, String>,
}

/// Any of the documents a template can be read from.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDocument {
    Devfile(Box<Devfile>),
    DevWorkspace(Box<DevWorkspace>),
    DevWorkspaceTemplate(Box<DevWorkspaceTemplate>),
}

impl TemplateDocument {
    /// Detect the document shape of a YAML or JSON body and decode it.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_slice(bytes).map_err(|e| parse_error(e.to_string()))?;

        let schema_version = raw.get("schemaVersion").and_then(serde_yaml::Value::as_str);
        if schema_version.is_some_and(|v| devfile_schema_version().is_match(v)) {
            let devfile: Devfile = serde_yaml::from_value(raw).map_err(|e| parse_error(e.to_string()))?;
            return Ok(Self::Devfile(Box::new(devfile)));
        }

        match raw.get("kind").and_then(serde_yaml::Value::as_str) {
            Some(DEVWORKSPACE_KIND) => {
                let dw: DevWorkspace = serde_yaml::from_value(raw).map_err(|e| parse_error(e.to_string()))?;
                Ok(Self::DevWorkspace(Box::new(dw)))
            }
            Some(DEVWORKSPACE_TEMPLATE_KIND) => {
                let dwt: DevWorkspaceTemplate =
                    serde_yaml::from_value(raw).map_err(|e| parse_error(e.to_string()))?;
                Ok(Self::DevWorkspaceTemplate(Box::new(dwt)))
            }
            _ => Err(parse_error(
                "content is not a devfile 2.x, DevWorkspace or DevWorkspaceTemplate".to_string(),
            )),
        }
    }

    /// Reduce the document to its template spec and labels.
    ///
    /// DevWorkspace contributions are dropped; callers that need them match
    /// on [`TemplateDocument::DevWorkspace`] directly.
    #[must_use]
    pub fn into_fetched(self) -> FetchedTemplate {
        match self {
            Self::Devfile(devfile) => {
                let labels = devfile.compatibility_labels();
                FetchedTemplate {
                    name: devfile.metadata.name.clone(),
                    spec: devfile.template,
                    labels,
                }
            }
            Self::DevWorkspace(dw) => FetchedTemplate {
                name: dw.metadata.name,
                spec: dw.spec.template,
                labels: dw.metadata.labels,
            },
            Self::DevWorkspaceTemplate(dwt) => FetchedTemplate {
                name: dwt.metadata.name,
                spec: dwt.spec,
                labels: dwt.metadata.labels,
            },
        }
    }
}

fn parse_error(reason: String) -> FlattenError {
    FlattenError::Parse {
        what: "template document".to_string(),
        reason,
    }
}
