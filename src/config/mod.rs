//! Configuration for the `dwflatten` binary
//!
//! The library itself takes everything it needs through
//! [`ResolverTools`]; this module builds those tools from a TOML file.
//!
//! # Location
//!
//! The first of these wins:
//!
//! 1. the `--config` flag
//! 2. the `DWFLATTEN_CONFIG` environment variable
//! 3. `dwflatten/config.toml` under the platform config directory
//!    (`~/.config` on Linux, `~/Library/Application Support` on macOS)
//!
//! A missing file at an explicitly given location is an error; a missing file
//! at the platform location means defaults.
//!
//! # Format
//!
//! ```toml
//! # Namespace of the workspace; default for Kubernetes references without one
//! namespace = "user-ns"
//!
//! # Registry used for `id` references without a `registryUrl`
//! default_registry_url = "https://registry.devfile.io"
//!
//! # Directory of DevWorkspaceTemplate files standing in for the cluster
//! templates_dir = "/srv/templates"
//!
//! # Timeout for each HTTP fetch
//! fetch_timeout_secs = 30
//!
//! [default_resources.limits]
//! memory = "1Gi"
//! cpu = "1"
//!
//! [default_resources.requests]
//! memory = "64Mi"
//! cpu = "100m"
//! ```

pub mod parser;

pub use parser::parse_config;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_FETCH_TIMEOUT};
use crate::fetch::ResolverTools;
use crate::fetch::network::ReqwestGetter;
use crate::fetch::store::DirectoryTemplateStore;
use crate::utils::ResourceRequirements;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace the workspace is resolved in
    pub namespace: String,
    pub default_registry_url: Option<String>,
    /// Directory of DevWorkspaceTemplate files used to resolve Kubernetes references
    pub templates_dir: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
    pub default_resources: DefaultResources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            default_registry_url: None,
            templates_dir: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            default_resources: DefaultResources::default(),
        }
    }
}

/// Resources applied to a contribution target that declares none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultResources {
    pub limits: ResourceValues,
    pub requests: ResourceValues,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceValues {
    pub memory: Option<String>,
    pub cpu: Option<String>,
}

/// Where the configuration file is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    /// Given by flag or environment; must exist
    pub explicit: bool,
}

/// Pick the configuration file from the flag, the environment value and the
/// platform config directory, in that order.
#[must_use]
pub fn config_location(flag: Option<&Path>, env_value: Option<&OsStr>) -> Option<ConfigLocation> {
    if let Some(path) = flag {
        return Some(ConfigLocation {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(ConfigLocation {
            path: PathBuf::from(value),
            explicit: true,
        });
    }
    default_config_path().map(|path| ConfigLocation {
        path,
        explicit: false,
    })
}

/// `dwflatten/config.toml` under the platform config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dwflatten").join("config.toml"))
}

impl Config {
    /// Load the configuration, honouring `--config` and `DWFLATTEN_CONFIG`.
    pub fn load(flag: Option<&Path>) -> Result<Self> {
        let env_value = std::env::var_os(CONFIG_PATH_ENV);
        match config_location(flag, env_value.as_deref()) {
            Some(location) if location.explicit || location.path.exists() => {
                debug!("Loading configuration from {}", location.path.display());
                parse_config(&location.path)
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Default resources as parsed quantities.
    pub fn default_resources(&self) -> Result<ResourceRequirements> {
        let limits = &self.default_resources.limits;
        let requests = &self.default_resources.requests;
        ResourceRequirements::from_strings(
            limits.memory.as_deref(),
            limits.cpu.as_deref(),
            requests.memory.as_deref(),
            requests.cpu.as_deref(),
        )
        .context("Invalid default_resources in configuration")
    }

    /// Build the tools for one resolution: a reqwest HTTP client and, when
    /// `templates_dir` is set, a directory-backed template store.
    pub fn resolver_tools(&self) -> Result<ResolverTools> {
        let http = ReqwestGetter::new(Duration::from_secs(self.fetch_timeout_secs))?;
        let mut tools = ResolverTools::new()
            .with_namespace(self.namespace.clone())
            .with_http_getter(Arc::new(http))
            .with_default_resources(self.default_resources()?);

        if let Some(registry) = &self.default_registry_url {
            tools = tools.with_default_registry(registry.clone());
        }
        if let Some(dir) = &self.templates_dir {
            tools = tools.with_template_getter(Arc::new(DirectoryTemplateStore::new(dir, self.namespace.clone())));
        }
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{Quantity, ResourceName};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.fetch_timeout_secs, 30);
        assert!(config.default_resources().unwrap().is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
namespace = "user-ns"

[default_resources.limits]
memory = "1Gi"
"#,
        )
        .unwrap();

        let config: Config = parse_config(&path).unwrap();
        assert_eq!(config.namespace, "user-ns");
        assert_eq!(config.fetch_timeout_secs, 30);
        assert!(config.templates_dir.is_none());

        let resources = config.default_resources().unwrap();
        assert_eq!(resources.limits.get(&ResourceName::Memory), Some(&Quantity::parse("1Gi").unwrap()));
        assert!(resources.requests.is_empty());
    }

    #[test]
    fn test_invalid_default_resources() {
        let mut config = Config::default();
        config.default_resources.requests.cpu = Some("lots".to_string());
        let err = config.default_resources().unwrap_err();
        assert!(err.to_string().contains("Invalid default_resources"));
    }

    #[test]
    fn test_location_priority() {
        let flag = Path::new("/from/flag.toml");
        let env = OsStr::new("/from/env.toml");

        let location = config_location(Some(flag), Some(env)).unwrap();
        assert_eq!(location.path, flag);
        assert!(location.explicit);

        let location = config_location(None, Some(env)).unwrap();
        assert_eq!(location.path, Path::new("/from/env.toml"));
        assert!(location.explicit);

        if let Some(location) = config_location(None, Some(OsStr::new(""))) {
            assert!(!location.explicit);
            assert!(location.path.ends_with("dwflatten/config.toml"));
        }
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = tempdir().unwrap();
        let err = Config::load(Some(&temp.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_resolver_tools() {
        let config = Config {
            namespace: "ns".to_string(),
            default_registry_url: Some("https://registry.example.com".to_string()),
            templates_dir: Some(PathBuf::from("/srv/templates")),
            ..Config::default()
        };
        let tools = config.resolver_tools().unwrap();
        assert_eq!(tools.workspace_namespace.as_deref(), Some("ns"));
        assert_eq!(tools.default_registry_url.as_deref(), Some("https://registry.example.com"));
        assert!(tools.template_getter.is_some());
        assert!(tools.http_getter.is_some());
    }
}
