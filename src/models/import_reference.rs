//! Where a plugin or parent is imported from.
//!
//! On the wire a reference is a loose set of optional fields (`kubernetes`,
//! `uri`, `id`, `registryUrl`). [`ImportReferenceSpec::validate`] turns that
//! into the closed [`ImportReference`] union, rejecting references that name
//! no source or more than one.

use crate::core::{FlattenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a DevWorkspaceTemplate object in a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KubernetesReference {
    /// Object name
    pub name: String,
    /// Object namespace; the workspace namespace when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Raw import reference as it appears in a plugin or parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReferenceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,
}

/// Validated import reference.
///
/// Equality is structural: two references are the same import when every
/// field matches, which is what cycle detection relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportReference {
    Kubernetes {
        name: String,
        namespace: Option<String>,
    },
    Uri {
        uri: String,
    },
    Id {
        id: String,
        registry_url: Option<String>,
    },
}

impl ImportReferenceSpec {
    /// Validate the raw reference held by `owner` (a component name or `parent`).
    pub fn validate(&self, owner: &str) -> Result<ImportReference> {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string);

        let mut sources = Vec::new();
        if let Some(k8s) = &self.kubernetes {
            if k8s.name.trim().is_empty() {
                return Err(FlattenError::InvalidReference {
                    component: owner.to_string(),
                    reason: "kubernetes reference has an empty name".to_string(),
                });
            }
            sources.push(ImportReference::Kubernetes {
                name: k8s.name.clone(),
                namespace: non_empty(&k8s.namespace),
            });
        }
        if let Some(uri) = non_empty(&self.uri) {
            sources.push(ImportReference::Uri {
                uri,
            });
        }
        if let Some(id) = non_empty(&self.id) {
            sources.push(ImportReference::Id {
                id,
                registry_url: non_empty(&self.registry_url),
            });
        }

        match sources.len() {
            1 => Ok(sources.remove(0)),
            0 => Err(FlattenError::InvalidReference {
                component: owner.to_string(),
                reason: "does not define any of kubernetes, uri or id".to_string(),
            }),
            _ => Err(FlattenError::InvalidReference {
                component: owner.to_string(),
                reason: "defines more than one of kubernetes, uri or id".to_string(),
            }),
        }
    }
}

impl fmt::Display for ImportReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kubernetes {
                name,
                namespace: Some(ns),
            } => write!(f, "kubernetes {ns}/{name}"),
            Self::Kubernetes {
                name,
                namespace: None,
            } => write!(f, "kubernetes {name}"),
            Self::Uri {
                uri,
            } => write!(f, "uri {uri}"),
            Self::Id {
                id,
                registry_url: Some(registry),
            } => write!(f, "id {id} from {registry}"),
            Self::Id {
                id,
                registry_url: None,
            } => write!(f, "id {id}"),
        }
    }
}
