//! DevWorkspaceTemplate lookup by Kubernetes name and namespace.
//!
//! Templates are importable from their own namespace only, unless the
//! template carries the `controller.devfile.io/allow-import-from` annotation:
//!
//! | Annotation value | Importable from |
//! |---|---|
//! | absent or empty | the template's namespace |
//! | `*` | every namespace |
//! | `ns-a, ns-b` | the template's namespace, `ns-a` and `ns-b` |
//!
//! A refused import fails with [`FlattenError::ImportDenied`], which renders
//! exactly like [`FlattenError::TemplateNotFound`].

use super::ResolverTools;
use crate::constants::ALLOW_IMPORT_FROM_ANNOTATION;
use crate::core::{FlattenError, Result};
use crate::models::{FetchedTemplate, ObjectMeta};
use tracing::debug;

/// Fetch the DevWorkspaceTemplate `name`, defaulting its namespace to the workspace's.
pub async fn fetch_by_kubernetes_ref(
    owner: &str,
    name: &str,
    namespace: Option<&str>,
    tools: &ResolverTools,
) -> Result<FetchedTemplate> {
    let getter = tools.template_getter.as_ref().ok_or_else(|| FlattenError::Config {
        message: format!("no Kubernetes client configured to resolve {owner}"),
    })?;

    let namespace = namespace.or(tools.workspace_namespace.as_deref()).ok_or_else(|| {
        FlattenError::InvalidReference {
            component: owner.to_string(),
            reason: format!("kubernetes reference '{name}' has no namespace and no default namespace is set"),
        }
    })?;

    debug!("Fetching DevWorkspaceTemplate {}/{} for {}", namespace, name, owner);
    let template = getter.get_template(name, namespace).await.map_err(|e| FlattenError::Fetch {
        location: format!("{namespace}/{name}"),
        reason: format!("{e:#}"),
    })?;

    let Some(template) = template else {
        return Err(FlattenError::TemplateNotFound {
            component: owner.to_string(),
        });
    };

    if !import_allowed(&template.metadata, namespace, tools.workspace_namespace.as_deref()) {
        debug!(
            "DevWorkspaceTemplate {}/{} does not allow import from namespace {:?}",
            namespace, name, tools.workspace_namespace
        );
        return Err(FlattenError::ImportDenied {
            component: owner.to_string(),
        });
    }

    Ok(FetchedTemplate {
        name: template.metadata.name.or_else(|| Some(name.to_string())),
        spec: template.spec,
        labels: template.metadata.labels,
    })
}

/// Whether a template living in `template_namespace` may be imported from
/// `workspace_namespace`.
///
/// Without a workspace namespace only `*` allows the import.
#[must_use]
pub fn import_allowed(metadata: &ObjectMeta, template_namespace: &str, workspace_namespace: Option<&str>) -> bool {
    if workspace_namespace == Some(template_namespace) {
        return true;
    }

    let allowed = metadata.annotations.get(ALLOW_IMPORT_FROM_ANNOTATION).map_or("", |v| v.trim());
    if allowed == "*" {
        return true;
    }

    let Some(workspace_namespace) = workspace_namespace else {
        return false;
    };
    allowed.split(',').map(str::trim).any(|ns| !ns.is_empty() && ns == workspace_namespace)
}
