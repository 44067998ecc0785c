//! Flattening of DevWorkspace template specs.
//!
//! A template spec may extend a parent template and import any number of
//! plugins, each referring to a Kubernetes DevWorkspaceTemplate, a URI or a
//! registry id. Plugins may import further plugins. [`resolve`] replaces all
//! of these references with the elements they point at, producing a
//! *flattened* spec: no parent and no plugin components.
//!
//! # Resolution Process
//!
//! 1. **Base case**: a spec that is already flattened and has no external
//!    contributions is returned unchanged.
//! 2. **Plugins**: every plugin component, then every contribution, is
//!    fetched ([`crate::fetch`]), patched with the overrides declared on the
//!    plugin, recorded in the [`ResolutionContextTree`] and checked for
//!    cycles, then resolved recursively. Each resulting element is annotated
//!    with the name of the plugin that imported it.
//! 3. **Parent**: the parent is fetched, must already be flattened, is
//!    annotated with `parent` and patched with the parent overrides.
//! 4. **Merge**: the spec's own elements, the parent and the plugin fragments
//!    are merged ([`merge::merge_elements`]), deduplicating volumes.
//!
//! At the top level only, the flattened spec then goes through:
//!
//! 5. **Variables**: `{{name}}` substitution. Undefined variables are returned
//!    as warnings alongside the spec and the remaining steps are skipped.
//! 6. **Container contributions**: merged into their target container when a
//!    contribution and a target exist ([`contributions`]).
//! 7. **Workspace environment**: propagated to every container ([`workspace_env`]).
//!
//! References are expanded one at a time, depth first, in declaration order.
//! The first error aborts the whole resolution; errors from nested references
//! carry one [`FlattenError::Reference`] breadcrumb per level.
//!
//! Editor compatibility is not checked here. Callers that want it pass the
//! returned tree to [`check_plugins_compatibility`].
//!
//! # Example
//!
//! ```rust,no_run
//! use devfile_flatten::fetch::ResolverTools;
//! use devfile_flatten::models::TemplateSpec;
//! use devfile_flatten::resolver::{check_plugins_compatibility, resolve};
//!
//! # async fn example(spec: TemplateSpec, tools: ResolverTools) -> devfile_flatten::core::Result<()> {
//! let resolved = resolve(&spec, &[], &tools).await?;
//! check_plugins_compatibility(&resolved.tree)?;
//! assert!(resolved.spec.is_flattened());
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod compatibility;
pub mod context_tree;
pub mod contributions;
pub mod merge;
pub mod workspace_env;

pub use compatibility::check_plugins_compatibility;
pub use context_tree::{ContextNode, ResolutionContextTree};

use crate::constants::PARENT_SOURCE_NAME;
use crate::core::{FlattenError, Result};
use crate::fetch::{ResolverTools, fetch_reference};
use crate::models::{Parent, PluginComponent, TemplateSpec, WorkspaceContribution};
use crate::overriding::{Overrides, override_spec};
use crate::variables::{VariableWarnings, substitute_variables};
use annotate::add_source_attributes;
use contributions::{merge_container_contributions, needs_container_contribution_merge};
use merge::{PluginFragment, merge_elements};
use petgraph::graph::NodeIndex;
use tracing::{debug, info, warn};
use workspace_env::resolve_workspace_env;

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedWorkspace {
    /// The flattened spec
    pub spec: TemplateSpec,
    /// Undefined variables, when substitution found any
    pub warnings: Option<VariableWarnings>,
    /// Every plugin imported while resolving, rooted at the workspace
    pub tree: ResolutionContextTree,
}

/// Flatten `spec`, importing `contributions` as additional plugins.
pub async fn resolve(
    spec: &TemplateSpec,
    contributions: &[WorkspaceContribution],
    tools: &ResolverTools,
) -> Result<ResolvedWorkspace> {
    let mut tree = ResolutionContextTree::new();
    let root = tree.root();
    let mut resolved = resolve_recursive(spec, contributions, tools, &mut tree, root).await?;
    info!("Resolved workspace with {} imported plugin(s)", tree.plugin_count());

    if let Some(warnings) = substitute_variables(&mut resolved)? {
        warn!("Workspace references undefined variables:\n{}", warnings);
        return Ok(ResolvedWorkspace {
            spec: resolved,
            warnings: Some(warnings),
            tree,
        });
    }

    if needs_container_contribution_merge(&resolved)? {
        merge_container_contributions(&mut resolved, &tools.default_resources)?;
    }
    resolve_workspace_env(&mut resolved)?;

    Ok(ResolvedWorkspace {
        spec: resolved,
        warnings: None,
        tree,
    })
}

async fn resolve_recursive(
    spec: &TemplateSpec,
    contributions: &[WorkspaceContribution],
    tools: &ResolverTools,
    tree: &mut ResolutionContextTree,
    node: NodeIndex,
) -> Result<TemplateSpec> {
    if spec.is_flattened() && contributions.is_empty() {
        return Ok(spec.clone());
    }

    let mut main = spec.clone();
    main.parent = None;
    main.components.retain(|c| !c.is_plugin());

    let plugins = spec.plugins().chain(contributions.iter().map(|c| (c.name.as_str(), &c.plugin)));
    let mut fragments = Vec::new();
    for (name, plugin) in plugins {
        let label = format!("plugin '{name}'");
        let fragment = resolve_plugin(name, plugin, tools, tree, node).await.map_err(|e| e.in_reference(&label))?;
        fragments.push(PluginFragment {
            label,
            spec: fragment,
        });
    }

    let parent = match &spec.parent {
        Some(parent) => Some(resolve_parent(parent, tools).await.map_err(|e| e.in_reference(PARENT_SOURCE_NAME))?),
        None => None,
    };

    merge_elements(main, parent, fragments)
}

async fn resolve_plugin(
    name: &str,
    plugin: &PluginComponent,
    tools: &ResolverTools,
    tree: &mut ResolutionContextTree,
    importer: NodeIndex,
) -> Result<TemplateSpec> {
    let reference = plugin.source.validate(name)?;
    debug!("Resolving plugin '{}' from {}", name, reference);

    let fetched = fetch_reference(name, &reference, tools).await?;
    let overrides = Overrides {
        components: &plugin.components,
        commands: &plugin.commands,
        ..Default::default()
    };
    let spec = override_spec(&fetched.spec, &overrides)?;

    let node = tree.add_plugin(importer, name, reference, fetched.labels);
    tree.check_cycle(node)?;

    let mut resolved = Box::pin(resolve_recursive(&spec, &[], tools, tree, node)).await?;
    add_source_attributes(&mut resolved, name);
    Ok(resolved)
}

async fn resolve_parent(parent: &Parent, tools: &ResolverTools) -> Result<TemplateSpec> {
    let reference = parent.source.validate(PARENT_SOURCE_NAME)?;
    debug!("Resolving parent from {}", reference);

    let fetched = fetch_reference(PARENT_SOURCE_NAME, &reference, tools).await?;
    let mut spec = fetched.spec;
    if !spec.is_flattened() {
        return Err(FlattenError::UnsupportedStructure {
            reason: "parents containing plugins or parents are not supported".to_string(),
        });
    }

    add_source_attributes(&mut spec, PARENT_SOURCE_NAME);
    override_spec(
        &spec,
        &Overrides {
            components: &parent.components,
            commands: &parent.commands,
            projects: &parent.projects,
            starter_projects: &parent.starter_projects,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        CONTAINER_CONTRIBUTION_ATTRIBUTE, EDITOR_NAME_LABEL, MERGED_CONTRIBUTIONS_ATTRIBUTE, PLUGIN_SOURCE_ATTRIBUTE,
    };
    use crate::models::{DevWorkspaceTemplate, ObjectMeta};
    use crate::test_utils::{FakeHttpGetter, FakeTemplateGetter, init_test_logging};
    use serde_json::json;
    use std::sync::Arc;

    const NS: &str = "user-ns";

    fn spec(yaml: &str) -> TemplateSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn template(name: &str, yaml: &str) -> DevWorkspaceTemplate {
        DevWorkspaceTemplate::new(
            ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec(yaml),
        )
    }

    fn labelled(mut template: DevWorkspaceTemplate, key: &str, value: &str) -> DevWorkspaceTemplate {
        template.metadata.labels.insert(key.to_string(), value.to_string());
        template
    }

    fn tools(getter: FakeTemplateGetter) -> ResolverTools {
        ResolverTools::new().with_namespace(NS).with_template_getter(Arc::new(getter))
    }

    #[tokio::test]
    async fn test_flattened_spec_is_returned_unchanged() {
        init_test_logging(None);
        let input = spec("components:\n  - name: tools\n    container: {image: busybox}\n");
        let resolved = resolve(&input, &[], &ResolverTools::new()).await.unwrap();
        assert_eq!(resolved.spec, input);
        assert!(resolved.warnings.is_none());
        assert_eq!(resolved.tree.plugin_count(), 0);
    }

    #[tokio::test]
    async fn test_plugin_is_inlined_with_provenance() {
        init_test_logging(None);
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            template(
                "web-terminal",
                "components:\n  - name: terminal\n    container: {image: terminal}\ncommands:\n  - id: open\n    exec: {component: terminal, commandLine: bash}\n",
            ),
        );
        let input = spec(
            "components:\n  - name: tools\n    container: {image: busybox}\n  - name: term\n    plugin:\n      kubernetes: {name: web-terminal}\n",
        );

        let resolved = resolve(&input, &[], &tools(getter)).await.unwrap();
        let spec = resolved.spec;

        assert!(spec.is_flattened());
        let names: Vec<_> = spec.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["terminal", "tools"]);
        assert_eq!(spec.components[0].attributes.get(PLUGIN_SOURCE_ATTRIBUTE), Some(&json!("term")));
        assert!(spec.components[1].attributes.get(PLUGIN_SOURCE_ATTRIBUTE).is_none());
        assert_eq!(spec.commands[0].attributes.get(PLUGIN_SOURCE_ATTRIBUTE), Some(&json!("term")));
        assert_eq!(resolved.tree.plugin_count(), 1);
    }

    #[tokio::test]
    async fn test_nested_plugins_are_attributed_to_outermost_importer() {
        let getter = FakeTemplateGetter::new()
            .with_template(
                NS,
                template("outer", "components:\n  - name: inner\n    plugin:\n      kubernetes: {name: inner}\n"),
            )
            .with_template(NS, template("inner", "components:\n  - name: deep\n    container: {image: deep}\n"));
        let input = spec("components:\n  - name: top\n    plugin:\n      kubernetes: {name: outer}\n");

        let resolved = resolve(&input, &[], &tools(getter)).await.unwrap();
        assert_eq!(resolved.spec.components.len(), 1);
        assert_eq!(resolved.spec.components[0].name, "deep");
        assert_eq!(resolved.spec.components[0].attributes.get(PLUGIN_SOURCE_ATTRIBUTE), Some(&json!("top")));
        assert_eq!(resolved.tree.plugin_count(), 2);
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let getter = FakeTemplateGetter::new()
            .with_template(NS, template("a", "components:\n  - name: B\n    plugin:\n      kubernetes: {name: b}\n"))
            .with_template(NS, template("b", "components:\n  - name: A\n    plugin:\n      kubernetes: {name: a}\n"));
        let input = spec("components:\n  - name: A\n    plugin:\n      kubernetes: {name: a}\n");

        let err = resolve(&input, &[], &tools(getter)).await.unwrap_err();
        assert!(matches!(err.root_cause(), FlattenError::Cycle { .. }));
        assert!(err.to_string().contains("devworkspace -> A -> B -> A"));
        assert_eq!(err.breadcrumbs(), vec!["plugin 'A'", "plugin 'B'", "plugin 'A'"]);
    }

    #[tokio::test]
    async fn test_contributions_are_resolved_as_plugins() {
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            labelled(
                template("che-code", "components:\n  - name: editor\n    container: {image: code}\n"),
                EDITOR_NAME_LABEL,
                "che-code",
            ),
        );
        let contributions: Vec<WorkspaceContribution> =
            serde_yaml::from_str("- name: editor-contribution\n  kubernetes: {name: che-code}\n").unwrap();
        let input = spec("components:\n  - name: tools\n    container: {image: busybox}\n");

        let resolved = resolve(&input, &contributions, &tools(getter)).await.unwrap();
        assert_eq!(resolved.spec.components.len(), 2);
        let node = resolved.tree.plugins().next().unwrap();
        assert_eq!(node.component_name, "editor-contribution");
        assert_eq!(node.labels.get(EDITOR_NAME_LABEL).map(String::as_str), Some("che-code"));
        assert!(check_plugins_compatibility(&resolved.tree).is_ok());
    }

    #[tokio::test]
    async fn test_plugin_overrides_are_applied() {
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            template("tooling", "components:\n  - name: tooling\n    container: {image: old, memoryLimit: 1Gi}\n"),
        );
        let input = spec(
            r#"
components:
  - name: tools
    plugin:
      kubernetes: {name: tooling}
      components:
        - name: tooling
          container: {image: new}
"#,
        );

        let resolved = resolve(&input, &[], &tools(getter)).await.unwrap();
        let container = resolved.spec.components[0].container().unwrap();
        assert_eq!(container.image.as_deref(), Some("new"));
        assert_eq!(container.memory_limit.as_deref(), Some("1Gi"));
    }

    #[tokio::test]
    async fn test_parent_is_merged_and_overridden() {
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            template(
                "base",
                "components:\n  - name: runtime\n    container: {image: base, memoryLimit: 512Mi}\ncommands:\n  - id: build\n    exec: {component: runtime, commandLine: make}\n",
            ),
        );
        let input = spec(
            r#"
parent:
  kubernetes: {name: base}
  components:
    - name: runtime
      container: {memoryLimit: 1Gi}
components:
  - name: tools
    container: {image: busybox}
"#,
        );

        let resolved = resolve(&input, &[], &tools(getter)).await.unwrap();
        let spec = resolved.spec;
        assert!(spec.parent.is_none());
        assert_eq!(spec.components[0].name, "runtime");
        assert_eq!(spec.components[0].container().unwrap().memory_limit.as_deref(), Some("1Gi"));
        assert_eq!(spec.components[0].attributes.get(PLUGIN_SOURCE_ATTRIBUTE), Some(&json!("parent")));
        assert_eq!(spec.commands[0].attributes.get(PLUGIN_SOURCE_ATTRIBUTE), Some(&json!("parent")));
        assert_eq!(resolved.tree.plugin_count(), 0);
    }

    #[tokio::test]
    async fn test_parent_with_plugins_is_unsupported() {
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            template("base", "components:\n  - name: p\n    plugin:\n      uri: https://example.com/p.yaml\n"),
        );
        let input = spec("parent:\n  kubernetes: {name: base}\n");

        let err = resolve(&input, &[], &tools(getter)).await.unwrap_err();
        assert!(matches!(err.root_cause(), FlattenError::UnsupportedStructure { .. }));
        assert_eq!(err.breadcrumbs(), vec!["parent"]);
    }

    #[tokio::test]
    async fn test_uri_plugin_accepts_devfile() {
        let http = FakeHttpGetter::new().with_document(
            "https://example.com/plugin.yaml",
            "schemaVersion: 2.2.0\nmetadata:\n  name: plugin\ncomponents:\n  - name: from-uri\n    container: {image: x}\n",
        );
        let tools = ResolverTools::new().with_http_getter(Arc::new(http));
        let input = spec("components:\n  - name: p\n    plugin:\n      uri: https://example.com/plugin.yaml\n");

        let resolved = resolve(&input, &[], &tools).await.unwrap();
        assert_eq!(resolved.spec.components[0].name, "from-uri");
    }

    #[tokio::test]
    async fn test_duplicate_component_across_sources_is_conflict() {
        let getter = FakeTemplateGetter::new()
            .with_template(NS, template("a", "components:\n  - name: tools\n    container: {image: a}\n"));
        let input = spec(
            "components:\n  - name: tools\n    container: {image: b}\n  - name: a\n    plugin:\n      kubernetes: {name: a}\n",
        );

        let err = resolve(&input, &[], &tools(getter)).await.unwrap_err();
        assert_eq!(err.to_string(), "component 'tools' is defined in both plugin 'a' and main");
    }

    #[tokio::test]
    async fn test_missing_template_is_wrapped() {
        let input = spec("components:\n  - name: missing\n    plugin:\n      kubernetes: {name: nope}\n");
        let err = resolve(&input, &[], &tools(FakeTemplateGetter::new())).await.unwrap_err();
        assert!(matches!(err.root_cause(), FlattenError::TemplateNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "failed to resolve plugin 'missing': plugin for component missing not found"
        );
    }

    #[tokio::test]
    async fn test_missing_parent_is_wrapped() {
        let input = spec("parent:\n  kubernetes: {name: base}\ncomponents:\n  - name: tools\n    container: {image: t}\n");
        let err = resolve(&input, &[], &tools(FakeTemplateGetter::new())).await.unwrap_err();
        assert!(matches!(err.root_cause(), FlattenError::TemplateNotFound { .. }));
        assert_eq!(err.breadcrumbs(), vec!["parent"]);
        assert_eq!(err.to_string(), "failed to resolve parent: plugin for component parent not found");
    }

    #[tokio::test]
    async fn test_variable_warnings_skip_contribution_merge() {
        let input = spec(
            r#"
components:
  - name: tools
    container: {image: "{{undefined}}"}
  - name: extra
    attributes:
      controller.devfile.io/container-contribution: true
    container: {image: extra}
"#,
        );
        let resolved = resolve(&input, &[], &ResolverTools::new()).await.unwrap();
        let warnings = resolved.warnings.unwrap();
        assert!(warnings.to_string().contains("undefined"));
        assert_eq!(resolved.spec.components.len(), 2);
    }

    #[tokio::test]
    async fn test_contributions_merge_into_workspace_container() {
        let getter = FakeTemplateGetter::new().with_template(
            NS,
            template(
                "java",
                r#"
components:
  - name: java-tools
    attributes:
      controller.devfile.io/container-contribution: true
    container:
      image: java
      memoryLimit: 50Mi
      env: [{name: JAVA_HOME, value: /opt/java}]
"#,
            ),
        );
        let input = spec(
            r#"
components:
  - name: tools
    container: {image: busybox, memoryLimit: 100Mi}
  - name: java-plugin
    plugin:
      kubernetes: {name: java}
"#,
        );

        let resolved = resolve(&input, &[], &tools(getter)).await.unwrap();
        let spec = resolved.spec;
        assert_eq!(spec.components.len(), 1);
        let tools = &spec.components[0];
        let container = tools.container().unwrap();
        assert_eq!(container.image.as_deref(), Some("busybox"));
        assert_eq!(container.memory_limit.as_deref(), Some("150Mi"));
        assert_eq!(container.env.len(), 1);
        assert_eq!(tools.attributes.get(MERGED_CONTRIBUTIONS_ATTRIBUTE), Some(&json!("java-plugin")));
        assert!(!tools.attributes.contains_key(CONTAINER_CONTRIBUTION_ATTRIBUTE));
    }

    #[tokio::test]
    async fn test_each_reference_is_fetched_every_time() {
        let getter = Arc::new(
            FakeTemplateGetter::new()
                .with_template(NS, template("shared", "components:\n  - name: cache\n    volume: {size: 1Gi}\n")),
        );
        let tools = ResolverTools::new().with_namespace(NS).with_template_getter(getter.clone());
        let input = spec(
            "components:\n  - name: one\n    plugin:\n      kubernetes: {name: shared}\n  - name: two\n    plugin:\n      kubernetes: {name: shared}\n",
        );

        let resolved = resolve(&input, &[], &tools).await.unwrap();
        assert_eq!(resolved.spec.components.len(), 1);
        let shared = (NS.to_string(), "shared".to_string());
        assert_eq!(getter.calls().await, vec![shared.clone(), shared]);
    }
}
