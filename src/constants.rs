//! Global constants used throughout the flattening library.
//!
//! This module contains the attribute, label and annotation keys that the
//! resolver reads and writes, the document kinds it recognizes, and the
//! timeouts used by the network fetchers. Defining them centrally keeps the
//! wire-visible strings in one place.

use std::time::Duration;

/// Attribute written on every element imported through a plugin or parent.
///
/// The value is the name of the plugin component that introduced the element,
/// or [`PARENT_SOURCE_NAME`] for elements inherited from the parent.
pub const PLUGIN_SOURCE_ATTRIBUTE: &str = "controller.devfile.io/imported-by";

/// Provenance value used for elements that come from the parent template.
pub const PARENT_SOURCE_NAME: &str = "parent";

/// Boolean attribute marking a container that should be merged into another container.
pub const CONTAINER_CONTRIBUTION_ATTRIBUTE: &str = "controller.devfile.io/container-contribution";

/// Boolean attribute explicitly selecting the container that receives contributions.
pub const MERGE_CONTRIBUTION_ATTRIBUTE: &str = "controller.devfile.io/merge-contribution";

/// Attribute listing the provenance of every contribution merged into a container.
pub const MERGED_CONTRIBUTIONS_ATTRIBUTE: &str = "controller.devfile.io/merged-contributions";

/// Attribute holding environment variables that apply to every container in the workspace.
pub const WORKSPACE_ENV_ATTRIBUTE: &str = "controller.devfile.io/workspace-env";

/// Annotation on a DevWorkspaceTemplate listing namespaces allowed to import it.
///
/// `*` allows every namespace; otherwise the value is a comma-separated list.
pub const ALLOW_IMPORT_FROM_ANNOTATION: &str = "controller.devfile.io/allow-import-from";

/// Label naming the editor a template provides.
pub const EDITOR_NAME_LABEL: &str = "devworkspace.devfile.io/editor-name";

/// Label naming the editor a template requires.
pub const EDITOR_COMPATIBILITY_LABEL: &str = "devworkspace.devfile.io/editor-compatibility";

/// Label used by the root of a resolution tree when formatting import chains.
pub const ROOT_NODE_NAME: &str = "devworkspace";

/// Kind of a DevWorkspace document.
pub const DEVWORKSPACE_KIND: &str = "DevWorkspace";

/// Kind of a DevWorkspaceTemplate document.
pub const DEVWORKSPACE_TEMPLATE_KIND: &str = "DevWorkspaceTemplate";

/// API version written on documents produced from devfiles.
pub const DEVWORKSPACE_API_VERSION: &str = "workspace.devfile.io/v1alpha2";

/// Path segment appended to a registry URL when fetching by id.
pub const REGISTRY_DEVFILES_PATH: &str = "devfiles";

/// Default timeout for a single HTTP fetch (30 seconds).
///
/// Applied to the reqwest client. Callers wanting a deadline for the whole
/// resolution wrap it in `tokio::time::timeout`.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "DWFLATTEN_CONFIG";
