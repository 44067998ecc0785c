//! Fetching the templates that plugins and parents refer to
//!
//! Every [`ImportReference`] variant has its own fetcher:
//!
//! - [`kubernetes`] - DevWorkspaceTemplate objects looked up by name and namespace,
//!   subject to the cross-namespace import policy
//! - [`network`] - HTTP GET of an arbitrary URI, with document-shape detection
//! - [`registry`] - registry ids, mapped to `{registry}/devfiles/{id}` and fetched as URIs
//!
//! [`fetch_reference`] dispatches over the variants. All I/O goes through the
//! two collaborator traits held by [`ResolverTools`]: [`TemplateGetter`] for
//! cluster lookups and [`HttpGetter`] for HTTP. Production code plugs in
//! [`network::ReqwestGetter`] and [`store::DirectoryTemplateStore`]; tests plug
//! in fakes.
//!
//! Nothing is cached: every call performs its own fetch.

pub mod kubernetes;
pub mod network;
pub mod registry;
pub mod store;

use crate::core::Result;
use crate::models::{DevWorkspaceTemplate, FetchedTemplate, ImportReference};
use crate::utils::ResourceRequirements;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Cluster lookup of DevWorkspaceTemplate objects.
#[async_trait]
pub trait TemplateGetter: Send + Sync {
    /// Return the template `name` in `namespace`, or `None` when it does not exist.
    ///
    /// Errors are reserved for failed lookups (API unreachable, decode errors).
    async fn get_template(&self, name: &str, namespace: &str) -> anyhow::Result<Option<DevWorkspaceTemplate>>;
}

/// Status and body of an HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Minimal HTTP client used by the URI and registry fetchers.
#[async_trait]
pub trait HttpGetter: Send + Sync {
    async fn get(&self, url: &str) -> anyhow::Result<HttpResponse>;
}

/// Everything a resolution needs from its environment.
///
/// Built fresh for each call; nothing in here is shared between resolutions
/// beyond the collaborator handles themselves.
#[derive(Clone, Default)]
pub struct ResolverTools {
    /// Namespace of the workspace being resolved; the default for Kubernetes
    /// references without a namespace and the importer identity for the
    /// import policy
    pub workspace_namespace: Option<String>,
    /// Registry used for id references that do not carry a `registryUrl`
    pub default_registry_url: Option<String>,
    pub template_getter: Option<Arc<dyn TemplateGetter>>,
    pub http_getter: Option<Arc<dyn HttpGetter>>,
    /// Applied to a contribution target before contribution resources are added
    pub default_resources: ResourceRequirements,
}

impl ResolverTools {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.workspace_namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_default_registry(mut self, registry_url: impl Into<String>) -> Self {
        self.default_registry_url = Some(registry_url.into());
        self
    }

    #[must_use]
    pub fn with_template_getter(mut self, getter: Arc<dyn TemplateGetter>) -> Self {
        self.template_getter = Some(getter);
        self
    }

    #[must_use]
    pub fn with_http_getter(mut self, getter: Arc<dyn HttpGetter>) -> Self {
        self.http_getter = Some(getter);
        self
    }

    #[must_use]
    pub fn with_default_resources(mut self, resources: ResourceRequirements) -> Self {
        self.default_resources = resources;
        self
    }
}

impl fmt::Debug for ResolverTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverTools")
            .field("workspace_namespace", &self.workspace_namespace)
            .field("default_registry_url", &self.default_registry_url)
            .field("template_getter", &self.template_getter.is_some())
            .field("http_getter", &self.http_getter.is_some())
            .field("default_resources", &self.default_resources)
            .finish()
    }
}

/// Fetch the template `reference` points at.
///
/// `owner` is the plugin component name (or `parent`) and is used in errors.
pub async fn fetch_reference(
    owner: &str,
    reference: &ImportReference,
    tools: &ResolverTools,
) -> Result<FetchedTemplate> {
    match reference {
        ImportReference::Kubernetes {
            name,
            namespace,
        } => kubernetes::fetch_by_kubernetes_ref(owner, name, namespace.as_deref(), tools).await,
        ImportReference::Uri {
            uri,
        } => network::fetch_by_uri(uri, tools).await,
        ImportReference::Id {
            id,
            registry_url,
        } => registry::fetch_by_id(owner, id, registry_url.as_deref(), tools).await,
    }
}
