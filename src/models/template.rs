//! The template spec: the unit the resolver works on.

use super::attributes::Attributes;
use super::command::{Command, Events, Project};
use super::component::{Component, PluginComponent};
use super::import_reference::ImportReferenceSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structural content shared by DevWorkspaces, DevWorkspaceTemplates and devfiles.
///
/// A spec is *flattened* when it has no parent and no plugin components;
/// see [`TemplateSpec::is_flattened`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependent_projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

impl TemplateSpec {
    /// Whether the spec has no parent and no plugin components.
    #[must_use]
    pub fn is_flattened(&self) -> bool {
        self.parent.is_none() && !self.components.iter().any(Component::is_plugin)
    }

    /// Plugin components in declaration order, with their names.
    pub fn plugins(&self) -> impl Iterator<Item = (&str, &PluginComponent)> {
        self.components.iter().filter_map(|c| c.plugin().map(|p| (c.name.as_str(), p)))
    }
}

/// Reference to the template this spec extends.
///
/// The override lists are partial elements applied to the fetched parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(flatten)]
    pub source: ImportReferenceSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<Value>,
}

/// A plugin contributed to a DevWorkspace from outside its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceContribution {
    pub name: String,
    #[serde(flatten)]
    pub plugin: PluginComponent,
}
