//! Test utilities for devfile-flatten
//!
//! This module provides fake collaborators and a loader for data-driven
//! resolution tests:
//!
//! - [`FakeTemplateGetter`] - in-memory DevWorkspaceTemplates keyed by namespace and name
//! - [`FakeHttpGetter`] - canned HTTP responses keyed by URL
//! - [`TestCase`] - a YAML file describing an input workspace, the templates
//!   its references resolve to, and the expected output or error
//!
//! Both fakes record every call so tests can assert on what was fetched.
//!
//! # Example
//!
//! ```rust,no_run
//! use devfile_flatten::test_utils::TestCase;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let case = TestCase::load("tests/fixtures/testdata/plugins/kubernetes-plugin.yaml")?;
//! let tools = case.tools()?;
//! let resolved = devfile_flatten::resolver::resolve(&case.input.workspace, &case.input.contributions, &tools).await?;
//! # Ok(())
//! # }
//! ```

use crate::fetch::{HttpGetter, HttpResponse, ResolverTools, TemplateGetter};
use crate::models::{DevWorkspaceTemplate, TemplateSpec, WorkspaceContribution};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tokio::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Namespace used by test cases that do not set one.
pub const TEST_NAMESPACE: &str = "test-namespace";

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` unset the `RUST_LOG`
/// environment variable is used, and without it no subscriber is installed.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// In-memory [`TemplateGetter`].
#[derive(Debug, Default)]
pub struct FakeTemplateGetter {
    templates: HashMap<(String, String), DevWorkspaceTemplate>,
    failures: HashMap<(String, String), String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeTemplateGetter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `template` from `namespace` under its metadata name.
    ///
    /// The template's metadata namespace is set to `namespace`.
    #[must_use]
    pub fn with_template(mut self, namespace: &str, mut template: DevWorkspaceTemplate) -> Self {
        let name = template.metadata.name.clone().unwrap_or_default();
        template.metadata.namespace = Some(namespace.to_string());
        self.templates.insert((namespace.to_string(), name), template);
        self
    }

    /// Fail lookups of `namespace/name` with `message`.
    #[must_use]
    pub fn with_failure(mut self, namespace: &str, name: &str, message: &str) -> Self {
        self.failures.insert((namespace.to_string(), name.to_string()), message.to_string());
        self
    }

    /// Every `(namespace, name)` looked up so far, in order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TemplateGetter for FakeTemplateGetter {
    async fn get_template(&self, name: &str, namespace: &str) -> Result<Option<DevWorkspaceTemplate>> {
        let key = (namespace.to_string(), name.to_string());
        self.calls.lock().await.push(key.clone());

        if let Some(message) = self.failures.get(&key) {
            bail!("{message}");
        }
        Ok(self.templates.get(&key).cloned())
    }
}

/// [`HttpGetter`] answering from a fixed URL map; unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct FakeHttpGetter {
    responses: HashMap<String, HttpResponse>,
    calls: Mutex<Vec<String>>,
}

impl FakeHttpGetter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with status 200 and `body`.
    #[must_use]
    pub fn with_document(self, url: &str, body: impl Into<String>) -> Self {
        self.with_response(url, 200, body)
    }

    #[must_use]
    pub fn with_response(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.into().into_bytes(),
            },
        );
        self
    }

    /// Every URL requested so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl HttpGetter for FakeHttpGetter {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().await.push(url.to_string());
        Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
            status: 404,
            body: Vec::new(),
        }))
    }
}

/// A data-driven resolution test.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub name: String,
    pub input: TestInput,
    pub output: TestOutput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInput {
    /// Namespace of the workspace, [`TEST_NAMESPACE`] when unset
    #[serde(default)]
    pub namespace: Option<String>,
    pub workspace: TemplateSpec,
    #[serde(default)]
    pub contributions: Vec<WorkspaceContribution>,
    #[serde(default)]
    pub default_registry_url: Option<String>,
    /// Templates served by the fake Kubernetes client; a template without a
    /// namespace lives in the workspace namespace
    #[serde(default)]
    pub kubernetes_templates: Vec<DevWorkspaceTemplate>,
    /// Documents served by the fake HTTP client, keyed by URL
    #[serde(default)]
    pub http_documents: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutput {
    #[serde(default)]
    pub workspace: Option<TemplateSpec>,
    /// Regular expression the error message must match
    #[serde(default)]
    pub err_regexp: Option<String>,
    /// Expected variable warnings, in their serialized form
    #[serde(default)]
    pub warnings: Option<serde_json::Value>,
}

impl TestCase {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read test case: {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse test case: {}", path.display()))
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.input.namespace.as_deref().unwrap_or(TEST_NAMESPACE)
    }

    /// Build resolver tools backed by fakes serving this case's templates.
    pub fn tools(&self) -> Result<ResolverTools> {
        let mut templates = FakeTemplateGetter::new();
        for template in &self.input.kubernetes_templates {
            let namespace = template.metadata.namespace.as_deref().unwrap_or(self.namespace()).to_string();
            templates = templates.with_template(&namespace, template.clone());
        }

        let mut http = FakeHttpGetter::new();
        for (url, document) in &self.input.http_documents {
            let body = serde_yaml::to_string(document)
                .with_context(|| format!("Failed to serialize document for {url} in {}", self.name))?;
            http = http.with_document(url, body);
        }

        let mut tools = ResolverTools::new()
            .with_namespace(self.namespace())
            .with_template_getter(Arc::new(templates))
            .with_http_getter(Arc::new(http));
        if let Some(registry) = &self.input.default_registry_url {
            tools = tools.with_default_registry(registry.clone());
        }
        Ok(tools)
    }
}

/// Load every `*.yaml` test case under `dir`, sorted by path.
pub fn load_test_cases(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, TestCase)>> {
    let dir = dir.as_ref();
    let mut cases = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "yaml") {
            cases.push((path.to_path_buf(), TestCase::load(path)?));
        }
    }
    if cases.is_empty() {
        bail!("No test cases found in {}", dir.display());
    }
    Ok(cases)
}
