//! Resolution tests driven by YAML cases and end-to-end properties.

use anyhow::{Context, Result, bail, ensure};
use devfile_flatten::core::FlattenError;
use devfile_flatten::fetch::ResolverTools;
use devfile_flatten::models::{ComponentKind, DevWorkspaceTemplate, ObjectMeta, TemplateSpec};
use devfile_flatten::resolver::{check_plugins_compatibility, resolve};
use devfile_flatten::test_utils::{FakeTemplateGetter, TestCase, init_test_logging, load_test_cases};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

fn testdata_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join("testdata")
}

async fn run_case(case: &TestCase) -> Result<()> {
    let tools = case.tools()?;
    let result = resolve(&case.input.workspace, &case.input.contributions, &tools).await;

    match (&case.output.err_regexp, result) {
        (Some(pattern), Err(err)) => {
            let re = Regex::new(pattern).with_context(|| format!("invalid errRegexp {pattern}"))?;
            ensure!(re.is_match(&err.to_string()), "error '{err}' does not match '{pattern}'");
        }
        (Some(pattern), Ok(_)) => bail!("expected an error matching '{pattern}', resolution succeeded"),
        (None, Err(err)) => bail!("unexpected error: {err}"),
        (None, Ok(resolved)) => {
            ensure!(resolved.spec.is_flattened(), "result still has a parent or plugin components");

            if let Some(expected) = &case.output.workspace {
                let actual = serde_yaml::to_string(&resolved.spec)?;
                ensure!(
                    &resolved.spec == expected,
                    "unexpected result:\n{actual}\nexpected:\n{}",
                    serde_yaml::to_string(expected)?
                );
            }

            let warnings = resolved.warnings.as_ref().map(serde_json::to_value).transpose()?;
            ensure!(
                warnings == case.output.warnings,
                "unexpected warnings {warnings:?}, expected {:?}",
                case.output.warnings
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_resolution_cases() {
    init_test_logging(None);

    let cases = load_test_cases(testdata_dir()).unwrap();
    let mut failures = Vec::new();
    for (path, case) in &cases {
        if let Err(e) = run_case(case).await {
            failures.push(format!("{} ({}): {e:#}", path.display(), case.name));
        }
    }

    assert!(failures.is_empty(), "{} of {} cases failed:\n\n{}", failures.len(), cases.len(), failures.join("\n\n"));
}

#[tokio::test]
async fn test_resolving_flattened_output_is_idempotent() {
    init_test_logging(None);

    for (path, case) in load_test_cases(testdata_dir()).unwrap() {
        if case.output.err_regexp.is_some() || case.output.warnings.is_some() {
            continue;
        }
        let tools = case.tools().unwrap();
        let first = resolve(&case.input.workspace, &case.input.contributions, &tools).await.unwrap();
        let second = resolve(&first.spec, &[], &ResolverTools::new()).await.unwrap();

        assert_eq!(second.spec, first.spec, "{} is not idempotent", path.display());
        assert_eq!(second.tree.plugin_count(), 0);
    }
}

#[tokio::test]
async fn test_cycle_error_kind_and_breadcrumbs() {
    let case = TestCase::load(testdata_dir().join("errors").join("cycle.yaml")).unwrap();
    let err = resolve(&case.input.workspace, &[], &case.tools().unwrap()).await.unwrap_err();

    assert!(matches!(err.root_cause(), FlattenError::Cycle { .. }));
    assert_eq!(err.breadcrumbs(), vec!["plugin 'A'", "plugin 'B'", "plugin 'A'"]);
}

#[tokio::test]
async fn test_denied_import_is_indistinguishable_from_missing() {
    let denied = TestCase::load(testdata_dir().join("namespaces").join("no-annotation-denied.yaml")).unwrap();
    let missing = TestCase::load(testdata_dir().join("namespaces").join("missing-template.yaml")).unwrap();

    let denied_err = resolve(&denied.input.workspace, &[], &denied.tools().unwrap()).await.unwrap_err();
    let missing_err = resolve(&missing.input.workspace, &[], &missing.tools().unwrap()).await.unwrap_err();

    assert!(matches!(denied_err.root_cause(), FlattenError::ImportDenied { .. }));
    assert!(matches!(missing_err.root_cause(), FlattenError::TemplateNotFound { .. }));
    assert_eq!(denied_err.to_string(), missing_err.to_string());
}

#[tokio::test]
async fn test_end_to_end_with_stub_kubernetes_client() {
    init_test_logging(None);

    let plugin_spec: TemplateSpec = serde_yaml::from_str(
        r#"
components:
  - name: sidecar
    container: {image: sidecar}
  - name: sidecar-data
    volume: {size: 1Gi}
commands:
  - id: sidecar-start
    exec: {component: sidecar, commandLine: start}
"#,
    )
    .unwrap();
    let getter = Arc::new(FakeTemplateGetter::new().with_template(
        "user-ns",
        DevWorkspaceTemplate::new(
            ObjectMeta {
                name: Some("sidecar-template".to_string()),
                ..Default::default()
            },
            plugin_spec,
        ),
    ));
    let tools = ResolverTools::new().with_namespace("user-ns").with_template_getter(getter.clone());

    let workspace: TemplateSpec = serde_yaml::from_str(
        r#"
components:
  - name: tools
    container: {image: tools}
  - name: my-sidecar
    plugin:
      kubernetes: {name: sidecar-template}
"#,
    )
    .unwrap();

    let resolved = resolve(&workspace, &[], &tools).await.unwrap();
    let spec = resolved.spec;

    assert!(spec.parent.is_none());
    assert!(!spec.components.iter().any(|c| matches!(c.kind, ComponentKind::Plugin(_))));
    for name in ["sidecar", "sidecar-data"] {
        let component = spec.components.iter().find(|c| c.name == name).unwrap();
        assert_eq!(
            component.attributes.get("controller.devfile.io/imported-by"),
            Some(&serde_json::json!("my-sidecar"))
        );
    }
    assert_eq!(
        spec.commands[0].attributes.get("controller.devfile.io/imported-by"),
        Some(&serde_json::json!("my-sidecar"))
    );
    assert_eq!(getter.calls().await, vec![("user-ns".to_string(), "sidecar-template".to_string())]);
    assert!(check_plugins_compatibility(&resolved.tree).is_ok());
}

#[tokio::test]
async fn test_compatibility_across_nested_plugins() {
    let mut editor = DevWorkspaceTemplate::new(
        ObjectMeta {
            name: Some("che-code".to_string()),
            ..Default::default()
        },
        serde_yaml::from_str("components:\n  - name: ext\n    plugin:\n      kubernetes: {name: theia-ext}\n").unwrap(),
    );
    editor.metadata.labels.insert("devworkspace.devfile.io/editor-name".to_string(), "che-code".to_string());

    let mut extension = DevWorkspaceTemplate::new(
        ObjectMeta {
            name: Some("theia-ext".to_string()),
            ..Default::default()
        },
        serde_yaml::from_str("components:\n  - name: ext-container\n    container: {image: ext}\n").unwrap(),
    );
    extension
        .metadata
        .labels
        .insert("devworkspace.devfile.io/editor-compatibility".to_string(), "theia".to_string());

    let getter = FakeTemplateGetter::new().with_template("ns", editor).with_template("ns", extension);
    let tools = ResolverTools::new().with_namespace("ns").with_template_getter(Arc::new(getter));
    let workspace: TemplateSpec =
        serde_yaml::from_str("components:\n  - name: editor\n    plugin:\n      kubernetes: {name: che-code}\n").unwrap();

    let resolved = resolve(&workspace, &[], &tools).await.unwrap();
    assert_eq!(resolved.tree.plugin_count(), 2);
    assert_eq!(
        resolved.tree.to_tree_string(),
        "devworkspace\n└── editor (kubernetes che-code)\n    └── ext (kubernetes theia-ext)\n"
    );

    let err = check_plugins_compatibility(&resolved.tree).unwrap_err();
    assert_eq!(
        err.to_string(),
        "devworkspace uses editor che-code (defined in component editor) but plugins [ext] depend on editor theia"
    );
}
