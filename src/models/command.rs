//! Commands, projects and lifecycle events.

use super::attributes::Attributes;
use super::component::EnvVar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A command identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    Exec(ExecCommand),
    Apply(ApplyCommand),
    Composite(CompositeCommand),
    Custom(Value),
}

/// Runs a command line inside a container component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommand {
    pub component: String,
    pub command_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Applies a component (image build, kubernetes object, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyCommand {
    pub component: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeCommand {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A project, starter project or dependent project.
///
/// The source (`git`, `zip`, `custom`) and location fields are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub source: BTreeMap<String, Value>,
}

/// Command ids bound to workspace lifecycle events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_start: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_start: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_stop: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_stop: Vec<String>,
}

impl Events {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre_start.is_empty()
            && self.post_start.is_empty()
            && self.pre_stop.is_empty()
            && self.post_stop.is_empty()
    }

    /// Append every event of `other` after the ones already present.
    pub fn append(&mut self, other: &Events) {
        self.pre_start.extend(other.pre_start.iter().cloned());
        self.post_start.extend(other.post_start.iter().cloned());
        self.pre_stop.extend(other.pre_stop.iter().cloned());
        self.post_stop.extend(other.post_stop.iter().cloned());
    }
}
