//! Components: the containers, volumes, plugins and other resources of a template.

use super::attributes::Attributes;
use super::import_reference::ImportReferenceSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A named component with exactly one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

/// The component union. Exactly one key on the wire selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Container(ContainerComponent),
    Volume(VolumeComponent),
    Plugin(PluginComponent),
    Kubernetes(Value),
    Openshift(Value),
    Image(Value),
    Custom(Value),
}

impl ComponentKind {
    /// Wire name of the kind, used in log and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::Volume(_) => "volume",
            Self::Plugin(_) => "plugin",
            Self::Kubernetes(_) => "kubernetes",
            Self::Openshift(_) => "openshift",
            Self::Image(_) => "image",
            Self::Custom(_) => "custom",
        }
    }
}

impl Component {
    pub fn container(&self) -> Option<&ContainerComponent> {
        match &self.kind {
            ComponentKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerComponent> {
        match &mut self.kind {
            ComponentKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn volume(&self) -> Option<&VolumeComponent> {
        match &self.kind {
            ComponentKind::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn plugin(&self) -> Option<&PluginComponent> {
        match &self.kind {
            ComponentKind::Plugin(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_plugin(&self) -> bool {
        matches!(self.kind, ComponentKind::Plugin(_))
    }
}

/// A container the workspace runs.
///
/// Memory and cpu fields are kept as the raw quantity strings from the
/// document; `utils::resources` parses them when arithmetic is needed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
    /// Remaining container fields (command, args, mountSources, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub target_port: u32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A volume shared between containers.
///
/// `ephemeral` is tri-state: unset volumes are persistent, but only an
/// explicit `false` forces a merged volume to become persistent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// A reference to another template to inline, with optional overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginComponent {
    #[serde(flatten)]
    pub source: ImportReferenceSpec,
    /// Partial components patched onto the imported template's components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    /// Partial commands patched onto the imported template's commands
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_component() {
        let yaml = r#"
name: tools
attributes:
  controller.devfile.io/container-contribution: true
container:
  image: quay.io/example/tools:latest
  memoryLimit: 512Mi
  mountSources: true
  env:
    - name: HOME
      value: /home/user
  endpoints:
    - name: http
      targetPort: 8080
      exposure: public
"#;
        let component: Component = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(component.name, "tools");
        let container = component.container().unwrap();
        assert_eq!(container.memory_limit.as_deref(), Some("512Mi"));
        assert_eq!(container.env, vec![EnvVar::new("HOME", "/home/user")]);
        assert_eq!(container.endpoints[0].target_port, 8080);
        assert_eq!(container.extra.get("mountSources"), Some(&Value::Bool(true)));
        assert!(!component.attributes.is_empty());
    }

    #[test]
    fn test_parse_plugin_component() {
        let yaml = r#"
name: java
plugin:
  kubernetes:
    name: java-plugin
    namespace: plugins
  components:
    - name: jdt
      container:
        memoryLimit: 2Gi
"#;
        let component: Component = serde_yaml::from_str(yaml).unwrap();
        assert!(component.is_plugin());
        let plugin = component.plugin().unwrap();
        assert_eq!(plugin.source.kubernetes.as_ref().unwrap().name, "java-plugin");
        assert_eq!(plugin.components.len(), 1);
    }

    #[test]
    fn test_serialize_volume_omits_unset_fields() {
        let component = Component {
            name: "data".into(),
            attributes: Attributes::new(),
            kind: ComponentKind::Volume(VolumeComponent {
                ephemeral: None,
                size: Some("1Gi".into()),
            }),
        };
        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value, serde_json::json!({"name": "data", "volume": {"size": "1Gi"}}));
    }
}
