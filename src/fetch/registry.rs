//! Registry-id references.
//!
//! A registry serves devfiles at `{registryUrl}/devfiles/{id}`, so fetching
//! by id is a URI fetch with a conventional path.

use super::ResolverTools;
use super::network::fetch_by_uri;
use crate::constants::REGISTRY_DEVFILES_PATH;
use crate::core::{FlattenError, Result};
use crate::models::FetchedTemplate;

/// URL of devfile `id` in `registry_url`.
#[must_use]
pub fn registry_devfile_url(registry_url: &str, id: &str) -> String {
    format!("{}/{}/{}", registry_url.trim_end_matches('/'), REGISTRY_DEVFILES_PATH, id)
}

/// Fetch devfile `id` from `registry_url`, or from the configured default registry.
pub async fn fetch_by_id(
    owner: &str,
    id: &str,
    registry_url: Option<&str>,
    tools: &ResolverTools,
) -> Result<FetchedTemplate> {
    let registry = registry_url
        .or(tools.default_registry_url.as_deref())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| FlattenError::InvalidReference {
            component: owner.to_string(),
            reason: format!("id '{id}' has no registryUrl and no default registry is configured"),
        })?;

    fetch_by_uri(&registry_devfile_url(registry, id), tools).await
}
