//! devfile-flatten - DevWorkspace template flattening
//!
//! A DevWorkspace template may extend a parent template and import plugins,
//! each pointing at a Kubernetes DevWorkspaceTemplate, an arbitrary URI or a
//! devfile registry id. Plugins may import further plugins. This crate
//! resolves all of those references into one self-contained template spec
//! that no longer has a parent or plugin components.
//!
//! # Architecture Overview
//!
//! Resolution is a depth-first walk over the import references of a spec:
//!
//! 1. every plugin (and every contribution supplied from outside the
//!    template) is fetched, checked for import cycles and resolved recursively
//! 2. the parent is fetched and must already be flat
//! 3. the spec, its parent and its plugin fragments are merged, folding
//!    together volumes that share a name
//! 4. at the top level, variables are substituted, container contributions
//!    are merged into their target container and workspace-wide environment
//!    variables are propagated
//!
//! All I/O goes through two injected collaborators, so the walk itself is
//! testable with in-memory fakes.
//!
//! # Core Modules
//!
//! - [`resolver`] - recursive resolution, cycle detection, merging,
//!   container contributions and editor compatibility
//! - [`fetch`] - Kubernetes, URI and registry fetchers and the collaborator traits
//! - [`models`] - template specs, components, commands and the documents carrying them
//! - [`overriding`] - generic merge and override primitives
//! - [`variables`] - `{{variable}}` substitution
//! - [`utils`] - resource quantities and container resource requirements
//! - [`core`] - error types and user-facing error formatting
//! - [`config`] - configuration file for the CLI
//! - [`cli`] - the `dwflatten` command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use devfile_flatten::fetch::ResolverTools;
//! use devfile_flatten::fetch::network::ReqwestGetter;
//! use devfile_flatten::models::TemplateSpec;
//! use devfile_flatten::resolver::resolve;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let spec: TemplateSpec = serde_yaml::from_str(
//!     r#"
//! components:
//!   - name: tools
//!     container: {image: quay.io/devfile/universal-developer-image}
//!   - name: terminal
//!     plugin:
//!       uri: https://example.com/plugins/terminal.yaml
//! "#,
//! )?;
//!
//! let tools = ResolverTools::new()
//!     .with_namespace("user-ns")
//!     .with_http_getter(Arc::new(ReqwestGetter::new(Duration::from_secs(30))?));
//! let resolved = resolve(&spec, &[], &tools).await?;
//! println!("{}", serde_yaml::to_string(&resolved.spec)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! dwflatten resolve workspace.yaml --templates-dir ./templates
//! dwflatten check workspace.yaml
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod resolver;

// Template model and primitives
pub mod models;
pub mod overriding;
pub mod variables;

// I/O at the edges
pub mod fetch;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
